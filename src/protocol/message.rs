use bincode::{Decode, Encode};

use crate::Status;

use super::{ProtocolError, Reply, request::*, response::*};

/// One request or reply. Exactly one `Message` travels in each frame.
#[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
pub enum Message {
    ConnectRequest(ConnectRequest),
    ConnectReply(ConnectReply),
    DisconnectRequest(DisconnectRequest),
    DisconnectReply(DisconnectReply),
    EnvRenameDbRequest(EnvRenameDbRequest),
    EnvRenameDbReply(EnvRenameDbReply),
    EnvEraseDbRequest(EnvEraseDbRequest),
    EnvEraseDbReply(EnvEraseDbReply),
    EnvGetDatabaseNamesRequest(EnvGetDatabaseNamesRequest),
    EnvGetDatabaseNamesReply(EnvGetDatabaseNamesReply),
    EnvGetParametersRequest(EnvGetParametersRequest),
    EnvGetParametersReply(EnvGetParametersReply),
    EnvFlushRequest(EnvFlushRequest),
    EnvFlushReply(EnvFlushReply),
    EnvCreateDbRequest(EnvCreateDbRequest),
    EnvCreateDbReply(EnvCreateDbReply),
    EnvOpenDbRequest(EnvOpenDbRequest),
    EnvOpenDbReply(EnvOpenDbReply),
    DbCloseRequest(DbCloseRequest),
    DbCloseReply(DbCloseReply),
    TxnBeginRequest(TxnBeginRequest),
    TxnBeginReply(TxnBeginReply),
    TxnCommitRequest(TxnCommitRequest),
    TxnCommitReply(TxnCommitReply),
    TxnAbortRequest(TxnAbortRequest),
    TxnAbortReply(TxnAbortReply),
}

macro_rules! protocol_messages {
    ($($request:ident => $reply:ident),+ $(,)?) => {
        /// Discriminant of a [`Message`], used to pair replies with requests.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum MessageKind {
            $($request, $reply,)+
        }

        impl Message {
            pub fn kind(&self) -> MessageKind {
                match self {
                    $(
                        Message::$request(_) => MessageKind::$request,
                        Message::$reply(_) => MessageKind::$reply,
                    )+
                }
            }
        }

        impl MessageKind {
            /// The reply kind a request of this kind must be answered with.
            /// `None` for reply kinds.
            pub fn reply_kind(self) -> Option<MessageKind> {
                match self {
                    $(
                        MessageKind::$request => Some(MessageKind::$reply),
                        MessageKind::$reply => None,
                    )+
                }
            }
        }

        $(
            impl From<$request> for Message {
                fn from(value: $request) -> Self {
                    Message::$request(value)
                }
            }

            impl From<$reply> for Message {
                fn from(value: $reply) -> Self {
                    Message::$reply(value)
                }
            }

            impl TryFrom<Message> for $reply {
                type Error = ProtocolError;

                fn try_from(value: Message) -> Result<Self, Self::Error> {
                    match value {
                        Message::$reply(reply) => Ok(reply),
                        other => Err(ProtocolError::UnexpectedReply {
                            expected: MessageKind::$reply,
                            received: other.kind(),
                        }),
                    }
                }
            }

            impl Reply for $reply {
                fn status(&self) -> Status {
                    self.status
                }
            }
        )+
    };
}

protocol_messages! {
    ConnectRequest => ConnectReply,
    DisconnectRequest => DisconnectReply,
    EnvRenameDbRequest => EnvRenameDbReply,
    EnvEraseDbRequest => EnvEraseDbReply,
    EnvGetDatabaseNamesRequest => EnvGetDatabaseNamesReply,
    EnvGetParametersRequest => EnvGetParametersReply,
    EnvFlushRequest => EnvFlushReply,
    EnvCreateDbRequest => EnvCreateDbReply,
    EnvOpenDbRequest => EnvOpenDbReply,
    DbCloseRequest => DbCloseReply,
    TxnBeginRequest => TxnBeginReply,
    TxnCommitRequest => TxnCommitReply,
    TxnAbortRequest => TxnAbortReply,
}

impl MessageKind {
    pub fn is_request(self) -> bool {
        self.reply_kind().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_pair_with_replies() {
        assert_eq!(
            MessageKind::ConnectRequest.reply_kind(),
            Some(MessageKind::ConnectReply)
        );
        assert_eq!(
            MessageKind::TxnAbortRequest.reply_kind(),
            Some(MessageKind::TxnAbortReply)
        );
        assert_eq!(MessageKind::EnvFlushReply.reply_kind(), None);
        assert!(!MessageKind::DbCloseReply.is_request());
    }

    #[test]
    fn reply_extraction_checks_kind() {
        let msg: Message = EnvFlushReply {
            status: Status::SUCCESS,
        }
        .into();

        let err = TxnBeginReply::try_from(msg).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::UnexpectedReply {
                expected: MessageKind::TxnBeginReply,
                received: MessageKind::EnvFlushReply,
            }
        ));
    }

    #[test]
    fn reply_exposes_status() {
        let msg: Message = TxnCommitReply {
            status: Status::TXN_CONFLICT,
        }
        .into();

        let reply = TxnCommitReply::try_from(msg).unwrap();
        assert_eq!(reply.status(), Status::TXN_CONFLICT);
    }
}
