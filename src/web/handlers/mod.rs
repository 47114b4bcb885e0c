pub mod cv_handlers;
pub mod generation_handlers;
pub mod helpers;
pub mod session_handlers;
pub mod system_handlers;

pub use cv_handlers::*;
pub use generation_handlers::*;
pub use session_handlers::*;
pub use system_handlers::*;

use rocket::http::Status;

/// Generic CORS handler that returns Status::Ok for any OPTIONS request
#[rocket::options("/<_..>")]
pub async fn universal_options_handler() -> Status {
    Status::Ok
}
