//! Wire shape of Expo push messages.

use serde::Serialize;

use crate::domain::ports::PushMessage;

#[derive(Debug, Serialize)]
pub(super) struct ExpoPushMessageDto<'a> {
    pub(super) to: &'a str,
    pub(super) title: &'a str,
    pub(super) body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) sound: Option<&'a str>,
}

impl<'a> From<&'a PushMessage> for ExpoPushMessageDto<'a> {
    fn from(message: &'a PushMessage) -> Self {
        Self {
            to: &message.to,
            title: &message.title,
            body: &message.body,
            sound: message.sound.as_deref(),
        }
    }
}
