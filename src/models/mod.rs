// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Account, Relationship, ContactEvent, MatchCandidate, LikedAccounts, GlobalIntimacyReport, SecondaryKey};
pub use requests::{AccountQuery, FindAccountQuery, RelationshipQuery};
pub use responses::{ProbabilityResponse, TotalIntimacyResponse, MatchesResponse, LikesResponse, StarResponse, FindAccountResponse, RelationshipIntimacyResponse, HealthResponse, ErrorResponse};
