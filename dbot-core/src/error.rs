use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbotError {
    /// The bot was blocked by the user, kicked, or otherwise forbidden from writing to the chat.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The chat does not exist or the bot is not a member of it.
    #[error("Chat not found: {0}")]
    ChatNotFound(String),

    #[error("Bot error: {0}")]
    Bot(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),
}

impl DbotError {
    /// True for the send failures that mean the chat can no longer be reached
    /// (`Forbidden` / `ChatNotFound`). Callers mark the user blocked on these.
    pub fn is_unreachable_chat(&self) -> bool {
        matches!(self, DbotError::Forbidden(_) | DbotError::ChatNotFound(_))
    }
}

#[derive(Error, Debug)]
pub enum HandlerError {
    /// A multi-step command found its stage or arguments in an unexpected state.
    #[error("State error: {0}")]
    State(String),
}

pub type Result<T> = std::result::Result<T, DbotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_chat_classes() {
        assert!(DbotError::Forbidden("bot was blocked by the user".into()).is_unreachable_chat());
        assert!(DbotError::ChatNotFound("chat not found".into()).is_unreachable_chat());
        assert!(!DbotError::Bot("timeout".into()).is_unreachable_chat());
        assert!(!DbotError::Handler(HandlerError::State("stage".into())).is_unreachable_chat());
    }
}
