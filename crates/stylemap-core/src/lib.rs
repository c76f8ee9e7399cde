pub mod conflict;
pub mod document;
pub mod enhance;
pub mod error;
pub mod id;
pub mod mapper;
pub mod model;
pub mod options;
pub mod parser;
pub mod report;
pub mod score;
pub mod stylesheet;
pub mod values;

pub use conflict::{ConflictKind, Severity, StyleConflict, detect_conflicts};
pub use document::{RawNode, load_design_tree};
pub use enhance::{EnhancementResult, EnhancementStatistics, enhance};
pub use error::{DocumentError, EnhanceError};
pub use id::NodeId;
pub use mapper::{MappingMethod, NodeStyleMapping, build_mappings};
pub use model::*;
pub use options::{EnhanceOptions, MappingStrategy};
pub use parser::{ParseDiagnostic, ParseOutcome, ParseStatistics, parse_stylesheet};
pub use report::render_report;
pub use score::score;
pub use stylesheet::{StyleDeclaration, StyleRule, specificity};

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
