//! Observable data models behind idoc object forms.
//!
//! A form is described by a [`DefinitionModel`] (the nested schema of fields
//! and regions) and filled in through an [`InstanceModel`] (one observable
//! property per field). Both publish change events through an
//! [`EventEmitter`]; in-place sequence edits on instance properties are
//! coalesced and delivered on the next [`Scheduler`] turn.
//!
//! The [`management`] module holds the template-inheritance trees used when
//! editing class and definition models: inherited members are copied on
//! write along a path and restored once they match their template again.

pub mod definition;
pub mod emitter;
pub mod error;
pub mod form;
pub mod instance;
pub mod management;
pub mod scheduler;
pub mod utils;

pub use definition::{DefinitionModel, DefinitionModelProperty, DefinitionOptions, NodeId, SchemaNode};
pub use emitter::{EventEmitter, Subscription, MODEL_VALIDATED, PROPERTY_CHANGED};
pub use error::ModelError;
pub use form::FormModels;
pub use instance::{InstanceModel, InstanceModelProperty, SequenceMut};
pub use management::{ModelId, ModelKind, ModelTree, PathStep};
pub use scheduler::Scheduler;
