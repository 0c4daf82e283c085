pub mod continuation;
pub mod record;
pub mod request;

pub use continuation::{ContinuationMessage, UserDecision};
pub use record::{ResultRecord, ResultSet};
pub use request::{FlightQuery, HotelQuery, PlaceQuery, SearchRequest};
