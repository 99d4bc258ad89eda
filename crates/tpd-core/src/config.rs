//! Protocol configuration.

use std::fmt;

use crate::{TpdError, TpdResult};

/// How far a packet may travel through connected vehicles in one hand-off.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ForwardingType {
    /// Only vehicles directly within communication range of the carrier.
    #[default]
    Vehicle,
    /// Any vehicle reachable through a chain of in-range vehicles on the
    /// searched road edges.
    Convoy,
}

/// Which next-carrier policy the selector applies.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum RoutingMode {
    /// Recompute EDR/EDD live for every contact.
    Greedy,
    /// Follow the encounter graph frozen into the packet at creation time.
    Source,
}

/// Which EDR recurrence the resolver runs.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum EdrVariant {
    /// Forward to every child in encounter order.
    FullFanOut,
    /// Forward only to the best order-preserving subsequence of children.
    OptimalSubsequence,
}

/// Top-level TPD configuration.
///
/// Typically deserialized from a JSON/TOML file by the application (with
/// the `serde` feature) and handed to the engine and selector by reference.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TpdConfig {
    /// Minimum meeting probability for a predicted encounter to become an
    /// edge of the encounter graph.
    pub encounter_probability_threshold: f64,

    /// Minimum EDR a greedy candidate needs before it may take the packet.
    pub delivery_probability_threshold: f64,

    /// V2V radio range in metres.
    pub communication_range: f64,

    /// Packet lifetime in seconds.  Encounters predicted beyond
    /// `now + packet_time_to_live` are ignored by the graph builder.
    pub packet_time_to_live: f64,

    pub forwarding_type: ForwardingType,

    /// `true` selects the optimal-subsequence EDR variant.
    pub encounter_graph_optimization: bool,

    /// `true` selects source routing over greedy routing.
    pub encounter_graph_source_routing: bool,

    /// Seconds added to every "is this encounter after the threshold?"
    /// comparison.
    pub causality_margin: f64,
}

impl Default for TpdConfig {
    fn default() -> Self {
        Self {
            encounter_probability_threshold: 0.1,
            delivery_probability_threshold:  0.5,
            communication_range:             200.0,
            packet_time_to_live:             3_600.0,
            forwarding_type:                 ForwardingType::Vehicle,
            encounter_graph_optimization:    false,
            encounter_graph_source_routing:  false,
            causality_margin:                0.0,
        }
    }
}

impl TpdConfig {
    #[inline]
    pub fn routing_mode(&self) -> RoutingMode {
        if self.encounter_graph_source_routing {
            RoutingMode::Source
        } else {
            RoutingMode::Greedy
        }
    }

    #[inline]
    pub fn edr_variant(&self) -> EdrVariant {
        if self.encounter_graph_optimization {
            EdrVariant::OptimalSubsequence
        } else {
            EdrVariant::FullFanOut
        }
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> TpdResult<()> {
        check_probability("encounter_probability_threshold", self.encounter_probability_threshold)?;
        check_probability("delivery_probability_threshold", self.delivery_probability_threshold)?;
        check_non_negative("communication_range", self.communication_range)?;
        check_non_negative("causality_margin", self.causality_margin)?;
        if !(self.packet_time_to_live > 0.0) {
            return Err(TpdError::Config(format!(
                "packet_time_to_live must be positive, got {}",
                self.packet_time_to_live
            )));
        }
        Ok(())
    }
}

fn check_probability(name: &str, value: f64) -> TpdResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TpdError::Config(format!("{name} must lie in [0, 1], got {value}")))
    }
}

fn check_non_negative(name: &str, value: f64) -> TpdResult<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(TpdError::Config(format!("{name} must be finite and >= 0, got {value}")))
    }
}

impl fmt::Display for RoutingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RoutingMode::Greedy => "greedy",
            RoutingMode::Source => "source",
        })
    }
}
