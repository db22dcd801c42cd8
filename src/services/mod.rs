pub mod auth_service;
pub mod complaint_service;
pub mod mailer;
pub mod message_service;
pub mod password_reset_service;
pub mod storage;

pub use auth_service::{AuthService, ClientInfo};
pub use complaint_service::ComplaintService;
pub use mailer::{LogMailer, Mailer};
pub use message_service::MessageService;
pub use password_reset_service::PasswordResetService;
pub use storage::{AttachmentStore, UploadedFile};
