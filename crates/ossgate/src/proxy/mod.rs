mod cors;
mod error;
mod options;
mod server;

pub use cors::{CORS_HEADERS, cors_middleware, with_cors};
pub use error::ProxyError;
pub use options::{
    REASONING_EFFORT_HEADER, ReasoningEffort, RequestOptions, SHOW_REASONING_HEADER,
    THREAD_ID_HEADER, USER_ID_HEADER,
};
pub use server::{AppState, GatewayServer, create_router};
