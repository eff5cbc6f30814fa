//! Legally Client
//!
//! Talks to the Legally backends and keeps the state the front end needs
//! around them.
//!
//! # Surfaces
//!
//! - **Upload**: validate and send a PDF for analysis
//! - **Auth**: bearer-token session with credential clearing on rejection
//! - **Chat**: legal assistant conversation and transcript export
//! - **Tasks**: cancellable status polling
//! - **Events**: an owned server event connection
//!
//! # Example
//!
//! ```rust,no_run
//! use legally_client::{ApiClient, ClientConfig, DocumentUpload};
//! use legally_content::AnalysisPipeline;
//!
//! # async fn example() -> Result<(), legally_client::ClientError> {
//! let client = ApiClient::new(ClientConfig::default())?;
//! let upload = DocumentUpload::from_path("contract.pdf").await?;
//!
//! let document = client.analyze(&upload).await?;
//! let view = AnalysisPipeline::default().render(&document);
//! println!("{}", view.document_type);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod api;
pub mod cancel;
pub mod chat;
pub mod config;
pub mod connection;
pub mod error;
pub mod poll;
pub mod session;
pub mod types;
pub mod upload;

// Re-exports for convenience
pub use api::ApiClient;
pub use cancel::{cancellable, CancellationToken};
pub use chat::{export_transcript, transcript_file_name, ChatBackend, ChatMessage, ChatRole, ChatSession};
pub use config::ClientConfig;
pub use connection::{ChannelTransport, Connection, ConnectionOptions, EventTransport, ServerEvent};
pub use error::{ClientError, ClientResult};
pub use poll::{PollOutcome, Poller, StatusSource};
pub use session::{CredentialStore, MemoryCredentialStore, Session, TokenValidator};
pub use types::{ChatHistory, ChatReply, HistoryEntry, HistoryRecord, Stats, TaskState, TaskStatus, UserProfile};
pub use upload::{format_file_size, DocumentUpload};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
