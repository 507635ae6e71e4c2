//! The typed library graph: terms, the per-import builder and the Turtle
//! serializer.

mod builder;
mod term;
mod turtle;

pub use builder::{Graph, GraphBuilder, GraphStats};
pub use term::{is_local_name_fragment, slug, Class, Fact, LocalName, Predicate, Term, NAMESPACE, XSD_NAMESPACE};
pub use turtle::{escape_literal, GraphSerializer, TURTLE_CONTENT_TYPE};
