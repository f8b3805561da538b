pub mod message;
pub mod notification;
pub mod receipt;
pub mod room;
pub mod settings;
pub mod state;
pub mod storage;
pub mod subscription;
pub mod user;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    _Room(#[from] room::Error),
    _Message(#[from] message::Error),
    _Receipt(#[from] receipt::Error),
    _Subscription(#[from] subscription::Error),
    _Notification(#[from] notification::Error),
    _Storage(#[from] storage::Error),
}
