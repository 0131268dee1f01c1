use super::{type_ids, PROTOCOL_SPACE};
use cz_01_object_store::{Id, IndexSpec, Object, Table};
use serde::Serialize;
use shared_types::{AccountName, Authority, ContentSide, Timestamp};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    pub id: Id<Content>,
    pub uploader: AccountName,
    pub url: String,
    pub title: String,
    pub manage_master: Authority,
    pub manage_comp: Option<Authority>,
    pub created: Timestamp,
    pub times_played: u64,
    pub times_played_24: u32,
    pub total_listening_time_24: u64,
    pub last_played: Timestamp,
    pub net_votes: i32,
    pub accumulated_payout: i64,
    pub disabled: bool,
}

impl Content {
    pub fn management(&self, side: ContentSide) -> Option<&Authority> {
        match side {
            ContentSide::Master => Some(&self.manage_master),
            ContentSide::Comp => self.manage_comp.as_ref(),
        }
    }
}

impl Object for Content {
    const SPACE_ID: u8 = PROTOCOL_SPACE;
    const TYPE_ID: u8 = type_ids::CONTENT;
    const TYPE_NAME: &'static str = "content";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn register_indices(table: &mut Table<Self>) {
        table.add_index::<ContentByUrl>();
    }
}

pub struct ContentByUrl;

impl IndexSpec<Content> for ContentByUrl {
    type Key = String;
    const NAME: &'static str = "by_url";
    const UNIQUE: bool = true;

    fn key(obj: &Content) -> String {
        obj.url.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentVote {
    pub id: Id<ContentVote>,
    pub content: Id<Content>,
    pub voter: AccountName,
    pub weight: i16,
    pub time: Timestamp,
}

impl Object for ContentVote {
    const SPACE_ID: u8 = PROTOCOL_SPACE;
    const TYPE_ID: u8 = type_ids::CONTENT_VOTE;
    const TYPE_NAME: &'static str = "content_vote";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn register_indices(table: &mut Table<Self>) {
        table.add_index::<VoteByContentVoter>();
    }
}

pub struct VoteByContentVoter;

impl IndexSpec<ContentVote> for VoteByContentVoter {
    type Key = (Id<Content>, AccountName);
    const NAME: &'static str = "by_content_voter";
    const UNIQUE: bool = true;

    fn key(obj: &ContentVote) -> Self::Key {
        (obj.content, obj.voter.clone())
    }
}
