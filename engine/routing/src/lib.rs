//! RailFX Routing
//!
//! The fiat smart-routing engine (provider scoring under objectives) and
//! the multi-rail router (fiat / CBDC / stablecoin route synthesis from
//! the template catalogue, scored under the same objectives).

pub mod catalogue;
pub mod materialise;
pub mod multirail;
pub mod route;
pub mod smart;

pub use catalogue::{catalogue, templates_for, RouteTemplate, TemplateKind};
pub use materialise::TemplateInapplicable;
pub use multirail::{MultiRailRequest, MultiRailResponse, MultiRailRouter};
pub use route::{Mechanism, Route, RouteAnnotations, RouteLeg, SubScores};
pub use smart::{RecommendRequest, RecommendResponse, RouteRecommendation, SmartRoutingEngine};
