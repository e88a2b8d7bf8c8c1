pub mod digest;
pub mod telegram;

pub use telegram::TelegramNotifier;
