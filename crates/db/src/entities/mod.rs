//! Database entities.

pub mod auth_token;
pub mod contact_info;
pub mod event;
pub mod gallery_item;
pub mod media;
pub mod place;
pub mod post;
pub mod review;
pub mod user;
pub mod user_profile;

pub use auth_token::Entity as AuthToken;
pub use contact_info::Entity as ContactInfo;
pub use event::Entity as Event;
pub use gallery_item::Entity as GalleryItem;
pub use media::Entity as Media;
pub use place::Entity as Place;
pub use post::Entity as Post;
pub use review::Entity as Review;
pub use user::Entity as User;
pub use user_profile::Entity as UserProfile;
