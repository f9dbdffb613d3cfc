use nextrip_transit::{StopNumber, TransitError};

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("Stop {0} is not on the board")]
    UnknownStop(StopNumber),

    #[error("Refreshing stop {stop} failed: {source}")]
    Feed {
        stop: StopNumber,
        #[source]
        source: TransitError,
    },
}

pub type Result<T> = std::result::Result<T, BoardError>;
