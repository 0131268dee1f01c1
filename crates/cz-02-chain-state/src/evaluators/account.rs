use super::define_evaluator;
use crate::chain_ensure;
use crate::database::Database;
use crate::domain::*;
use shared_types::{
    AccountCreateOperation, Asset, AssetSymbol, BalanceClaimOperation,
    DelegateVestingSharesOperation, TransferOperation, TransferToVestingOperation,
    WithdrawVestingOperation,
};

define_evaluator!(AccountCreateEvaluator, AccountCreate, AccountCreateOperation, account_create);
define_evaluator!(TransferEvaluator, Transfer, TransferOperation, transfer);
define_evaluator!(TransferToVestingEvaluator, TransferToVesting, TransferToVestingOperation, transfer_to_vesting);
define_evaluator!(WithdrawVestingEvaluator, WithdrawVesting, WithdrawVestingOperation, withdraw_vesting);
define_evaluator!(
    DelegateVestingSharesEvaluator,
    DelegateVestingShares,
    DelegateVestingSharesOperation,
    delegate_vesting_shares
);
define_evaluator!(BalanceClaimEvaluator, BalanceClaim, BalanceClaimOperation, balance_claim);

fn account_create(db: &mut Database, op: &AccountCreateOperation) -> ChainResult<()> {
    let minimum = db.config().account_creation_fee;
    chain_ensure!(
        op.fee.amount >= minimum,
        "account creation fee {} is below the minimum {}",
        op.fee,
        Asset::core(minimum)
    );
    db.get_account(&op.creator)?;
    chain_ensure!(
        db.find_account(&op.new_account_name).is_none(),
        "account {} already exists",
        op.new_account_name
    );
    for authority in [&op.owner, &op.active, &op.basic] {
        for name in authority.account_auths.keys() {
            db.get_account(name)?;
        }
    }

    db.adjust_balance(&op.creator, Asset::core(-op.fee.amount))?;
    db.create_account(op.new_account_name.clone(), |a| {
        a.owner = op.owner.clone();
        a.active = op.active.clone();
        a.basic = op.basic.clone();
        a.memo_key = op.memo_key.clone();
        a.json_metadata = op.json_metadata.clone();
    })?;
    if op.fee.amount > 0 {
        db.create_vesting(&op.new_account_name, op.fee.amount)?;
    }
    Ok(())
}

fn transfer(db: &mut Database, op: &TransferOperation) -> ChainResult<()> {
    db.get_account(&op.to)?;
    db.adjust_balance(&op.from, Asset::new(-op.amount.amount, op.amount.symbol))?;
    db.adjust_balance(&op.to, op.amount)
}

fn transfer_to_vesting(db: &mut Database, op: &TransferToVestingOperation) -> ChainResult<()> {
    let to = op.to.clone().unwrap_or_else(|| op.from.clone());
    db.get_account(&to)?;
    db.adjust_balance(&op.from, Asset::core(-op.amount.amount))?;
    db.create_vesting(&to, op.amount.amount)?;
    Ok(())
}

fn withdraw_vesting(db: &mut Database, op: &WithdrawVestingOperation) -> ChainResult<()> {
    let now = db.head_block_time()?;
    let intervals = i64::from(db.config().vesting_withdraw_intervals);
    let interval_seconds = db.config().vesting_withdraw_interval_seconds;
    let account = db.get_account(&op.account)?;
    let amount = op.vesting_shares.amount;

    chain_ensure!(
        account.vesting_shares >= amount,
        "{} has {} vesting, cannot withdraw {}",
        op.account,
        Asset::vests(account.vesting_shares),
        op.vesting_shares
    );
    chain_ensure!(
        account.vesting_shares - account.delegated_vesting_shares >= amount,
        "{} cannot withdraw {} while {} is delegated",
        op.account,
        op.vesting_shares,
        Asset::vests(account.delegated_vesting_shares)
    );

    if amount == 0 {
        chain_ensure!(
            account.vesting_withdraw_rate != 0,
            "{} has no vesting withdrawal to cancel",
            op.account
        );
        return db.modify_account(&op.account, |a| {
            a.vesting_withdraw_rate = 0;
            a.next_vesting_withdrawal = shared_types::constants::TIME_MAX;
            a.to_withdraw = 0;
            a.withdrawn = 0;
        });
    }

    let rate = (amount / intervals).max(1);
    chain_ensure!(
        account.vesting_withdraw_rate != rate || account.to_withdraw != amount,
        "vesting withdrawal of {} is already scheduled",
        op.vesting_shares
    );
    db.modify_account(&op.account, |a| {
        a.vesting_withdraw_rate = rate;
        a.next_vesting_withdrawal = now + interval_seconds;
        a.to_withdraw = amount;
        a.withdrawn = 0;
    })
}

fn delegate_vesting_shares(db: &mut Database, op: &DelegateVestingSharesOperation) -> ChainResult<()> {
    let now = db.head_block_time()?;
    let return_period = db.config().delegation_return_period;
    let available = db.get_account(&op.delegator)?.available_vesting_shares();
    let delegatee = db.get_account(&op.delegatee)?;
    let (received, redelegated) = (
        delegatee.received_vesting_shares,
        delegatee.redelegated_vesting_shares,
    );
    let amount = op.vesting_shares.amount;
    let existing = db
        .find_delegation(&op.delegator, &op.delegatee)
        .map(|d| (d.id, d.vesting_shares, d.min_delegation_time));

    match existing {
        None => {
            chain_ensure!(
                amount > 0,
                "{} has no delegation to {} to remove",
                op.delegator,
                op.delegatee
            );
            chain_ensure!(
                available >= amount,
                "{} has {} available to delegate, {} requested",
                op.delegator,
                Asset::vests(available),
                op.vesting_shares
            );
            db.store_mut().create(|id| VestingDelegation {
                id,
                delegator: op.delegator.clone(),
                delegatee: op.delegatee.clone(),
                vesting_shares: amount,
                min_delegation_time: now,
            })?;
            db.modify_account(&op.delegator, |a| a.delegated_vesting_shares += amount)?;
            db.modify_account(&op.delegatee, |a| a.received_vesting_shares += amount)
        }
        Some((id, current, _)) if amount > current => {
            let delta = amount - current;
            chain_ensure!(
                available >= delta,
                "{} has {} available to delegate, {} more requested",
                op.delegator,
                Asset::vests(available),
                Asset::vests(delta)
            );
            db.store_mut().modify(id, |d| d.vesting_shares = amount)?;
            db.modify_account(&op.delegator, |a| a.delegated_vesting_shares += delta)?;
            db.modify_account(&op.delegatee, |a| a.received_vesting_shares += delta)
        }
        Some((id, current, min_delegation_time)) => {
            let delta = current - amount;
            chain_ensure!(delta > 0, "delegation is already {}", op.vesting_shares);
            chain_ensure!(
                received - delta >= redelegated,
                "{} has redelegated {} and cannot give back {}",
                op.delegatee,
                Asset::vests(redelegated),
                Asset::vests(delta)
            );
            db.store_mut().create(|eid| VestingDelegationExpiration {
                id: eid,
                delegator: op.delegator.clone(),
                vesting_shares: delta,
                expiration: (now + return_period).max(min_delegation_time),
            })?;
            db.modify_account(&op.delegatee, |a| a.received_vesting_shares -= delta)?;
            if amount == 0 {
                db.store_mut().remove(id)?;
            } else {
                db.store_mut().modify(id, |d| d.vesting_shares = amount)?;
            }
            Ok(())
        }
    }
}

fn balance_claim(db: &mut Database, op: &BalanceClaimOperation) -> ChainResult<()> {
    db.get_account(&op.deposit_to_account)?;
    let key = (op.balance_owner_key.clone(), op.total_claimed.symbol);
    let (id, held) = db
        .store()
        .find_by::<UnclaimedBalance, BalanceByOwner>(&key)
        .map(|b| (b.id, b.balance))
        .ok_or_else(|| {
            ChainError::not_found("unclaimed balance", format!("{} {}", key.0, key.1))
        })?;
    chain_ensure!(
        matches!(held.symbol, AssetSymbol::Core | AssetSymbol::Stable),
        "unclaimed balance {} is not claimable",
        held
    );
    chain_ensure!(
        op.total_claimed.amount <= held.amount,
        "cannot claim {} from an unclaimed balance of {}",
        op.total_claimed,
        held
    );

    if op.total_claimed.amount == held.amount {
        db.store_mut().remove(id)?;
    } else {
        db.store_mut()
            .modify(id, |b| b.balance.amount -= op.total_claimed.amount)?;
    }
    db.adjust_balance(&op.deposit_to_account, op.total_claimed)
}
