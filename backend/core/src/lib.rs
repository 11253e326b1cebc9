pub mod catalog;
pub mod error;
pub mod machine;
pub mod reaper;
pub mod service;
pub mod session;
pub mod store;
pub mod traits;

pub use catalog::{Catalog, CatalogEntry, Price};
pub use error::OrderError;
pub use machine::{OrderEvent, OrderMachine, Outcome, OutboundMessage, Rejection, SelectOption};
pub use reaper::SessionReaper;
pub use service::{DispatchReport, OrderService};
pub use session::{CompletedOrder, ConversationId, OrderState, Requester, SelectedItem, Session};
pub use store::SessionStore;
pub use traits::{MessageSink, NotificationSink};
