use super::define_evaluator;
use crate::database::Database;
use crate::domain::ChainResult;
use shared_types::{FriendshipOperation, UnfriendOperation};

define_evaluator!(FriendshipEvaluator, Friendship, FriendshipOperation, friendship);
define_evaluator!(UnfriendEvaluator, Unfriend, UnfriendOperation, unfriend);

fn friendship(db: &mut Database, op: &FriendshipOperation) -> ChainResult<()> {
    db.request_friendship(&op.account, &op.other)
}

fn unfriend(db: &mut Database, op: &UnfriendOperation) -> ChainResult<()> {
    db.unfriend(&op.account, &op.other)
}
