pub mod followers;
pub mod posts;
pub mod sessions;
pub mod users;

pub use followers::FollowerRepository;
pub use posts::PostRepository;
pub use sessions::SessionRepository;
pub use users::UserRepository;
