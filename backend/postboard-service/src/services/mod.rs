/// Business logic layer over the document store
pub mod media;
pub mod notifications;
pub mod posts;
pub mod users;
pub mod validation;

pub use media::MediaStorage;
pub use notifications::NotificationService;
pub use posts::PostService;
pub use users::UserService;
