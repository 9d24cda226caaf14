// # Tophost Panel
//
// Session client for the Tophost control panel (https://cp.tophost.it).
//
// The panel has no API. Everything here drives the same endpoints a browser
// would: a cookie-based login sequence, the HTML record page, and a
// form-encoded mutation endpoint answering with a small JSON object.
//
// ## Modules
//
// - `session`: login state machine and the [`PanelSession`] implementation
// - `markup`: extraction of the record table from the DNS page
//
// [`PanelSession`]: cpdns_core::traits::PanelSession

mod markup;
mod session;

pub use markup::parse_record_table;
pub use session::{NODE_COOKIE, SESSION_COOKIE, SessionState, TophostPanel};

