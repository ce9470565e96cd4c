//! Error taxonomy for the game engine
//!
//! Validation errors are expected user-facing outcomes and are mapped to
//! friendly replies by the command layer. `InvalidRingState` is different: it
//! means the single-cycle invariant is broken, which is a bug, so it is
//! logged loudly wherever it is produced and never silently swallowed.

pub type GameResult<T> = Result<T, GameError>;

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("a game is already registered to this master")]
    DuplicateGame,

    #[error("no such game")]
    NotFound,

    #[error("the game has already started")]
    AlreadyStarted,

    #[error("the game has not started yet")]
    NotStarted,

    #[error("not enough players enrolled (need at least {0})")]
    InsufficientPlayers(usize),

    #[error("not authorized to act on this player")]
    NotAuthorized,

    #[error("target ring invariant violated: {0}")]
    InvalidRingState(String),

    #[error("this kill has already been claimed")]
    DuplicateClaim,

    #[error("nobody has claimed your kill (yet)")]
    NoPendingClaim,

    #[error("a task is already active for this game")]
    TaskAlreadyActive,

    #[error("no task is currently active")]
    NoActiveTask,

    #[error("this answer is not correct")]
    IncorrectAnswer,

    #[error("already enrolled in a running game")]
    AlreadyEnrolled,

    #[error("not enrolled in a game")]
    NotEnrolled,

    #[error("this game does not exist or is not joinable anymore")]
    GameNotJoinable,

    #[error("solution pattern does not compile: {0}")]
    InvalidSolutionPattern(String),
}

impl GameError {
    /// Stable wire code for `Reply::Error`
    pub fn code(&self) -> &'static str {
        match self {
            GameError::DuplicateGame => "DUPLICATE_GAME",
            GameError::NotFound => "NOT_FOUND",
            GameError::AlreadyStarted => "ALREADY_STARTED",
            GameError::NotStarted => "NOT_STARTED",
            GameError::InsufficientPlayers(_) => "INSUFFICIENT_PLAYERS",
            GameError::NotAuthorized => "NOT_AUTHORIZED",
            GameError::InvalidRingState(_) => "INVALID_RING_STATE",
            GameError::DuplicateClaim => "DUPLICATE_CLAIM",
            GameError::NoPendingClaim => "NO_PENDING_CLAIM",
            GameError::TaskAlreadyActive => "TASK_ALREADY_ACTIVE",
            GameError::NoActiveTask => "NO_ACTIVE_TASK",
            GameError::IncorrectAnswer => "INCORRECT_ANSWER",
            GameError::AlreadyEnrolled => "ALREADY_ENROLLED",
            GameError::NotEnrolled => "NOT_ENROLLED",
            GameError::GameNotJoinable => "GAME_NOT_JOINABLE",
            GameError::InvalidSolutionPattern(_) => "INVALID_SOLUTION_PATTERN",
        }
    }
}
