//! Per-block processing run by [`Database::commit_block`] before the
//! invariant check. Head block fields are advanced when the block session
//! opens.

use super::Database;
use crate::domain::*;
use cadenza_telemetry::log_block_event;
use shared_types::constants::{CONTENT_PAYOUT_INTERVAL, TIME_MAX};
use shared_types::{
    Asset, ContentRewardOperation, FillConvertRequestOperation, FillVestingWithdrawOperation,
    ProducerRewardOperation, ReturnVestingDelegationOperation, Timestamp,
};

impl Database {
    pub(crate) fn process_block(&mut self) -> ChainResult<()> {
        let now = self.head_block_time()?;
        self.pay_block_rewards()?;
        self.clear_expired_orders(now)?;
        self.process_vesting_withdrawals(now)?;
        self.return_expired_delegations(now)?;
        self.process_conversions(now)?;
        self.clear_expired_proposals(now)?;
        self.expire_reports(now)?;
        self.pay_content_rewards(now)?;
        Ok(())
    }

    fn pay_block_rewards(&mut self) -> ChainResult<()> {
        let producer = self.global()?.current_witness.clone();
        let producer_reward = self.config.producer_reward_per_block;
        let content_reward = self.config.content_reward_per_block;

        if producer_reward > 0 {
            self.modify_global(|g| g.current_supply += producer_reward)?;
            let vests = self.create_vesting(&producer, producer_reward)?;
            self.push_virtual_operation(ProducerRewardOperation {
                producer,
                vesting_shares: Asset::vests(vests),
            })?;
        }
        if content_reward > 0 {
            self.modify_global(|g| {
                g.current_supply += content_reward;
                g.total_reward_fund += content_reward;
            })?;
        }
        Ok(())
    }

    fn process_vesting_withdrawals(&mut self, now: Timestamp) -> ChainResult<()> {
        let due: Vec<_> = self
            .store
            .range_by::<Account, AccountByNextWithdrawal, _>(..=now)
            .map(|a| a.name.clone())
            .collect();
        let interval = self.config.vesting_withdraw_interval_seconds;

        for name in due {
            let account = self.get_account(&name)?;
            let remaining = account.to_withdraw - account.withdrawn;
            let unlocked = account.vesting_shares - account.delegated_vesting_shares;
            let vests = account.vesting_withdraw_rate.min(remaining).min(unlocked).max(0);
            let finished = vests == 0 || account.withdrawn + vests >= account.to_withdraw;
            let core = self.global()?.vests_to_core(vests);

            self.modify_account(&name, |a| {
                a.balance += core;
                if finished {
                    a.vesting_withdraw_rate = 0;
                    a.next_vesting_withdrawal = TIME_MAX;
                    a.withdrawn = 0;
                    a.to_withdraw = 0;
                } else {
                    a.withdrawn += vests;
                    a.next_vesting_withdrawal += interval;
                }
            })?;
            self.modify_global(|g| {
                g.total_vesting_fund -= core;
                g.total_vesting_shares -= vests;
            })?;
            self.adjust_vesting_shares(&name, -vests)?;

            if vests > 0 {
                self.push_virtual_operation(FillVestingWithdrawOperation {
                    account: name,
                    withdrawn: Asset::vests(vests),
                    deposited: Asset::core(core),
                })?;
            }
        }
        Ok(())
    }

    fn return_expired_delegations(&mut self, now: Timestamp) -> ChainResult<()> {
        let due: Vec<_> = self
            .store
            .range_by::<VestingDelegationExpiration, ExpirationByTime, _>(..=now)
            .map(|e| (e.id, e.delegator.clone(), e.vesting_shares))
            .collect();
        for (id, delegator, vesting_shares) in due {
            self.modify_account(&delegator, |a| a.delegated_vesting_shares -= vesting_shares)?;
            self.store.remove(id)?;
            self.push_virtual_operation(ReturnVestingDelegationOperation {
                account: delegator,
                vesting_shares: Asset::vests(vesting_shares),
            })?;
        }
        Ok(())
    }

    fn process_conversions(&mut self, now: Timestamp) -> ChainResult<()> {
        let Some(median) = self.global()?.current_median_price else {
            return Ok(());
        };
        let due: Vec<_> = self
            .store
            .range_by::<ConvertRequest, ConvertByDate, _>(..=now)
            .map(|r| r.id)
            .collect();
        for id in due {
            let request = self.store.remove(id)?;
            let amount_in = Asset::stable(request.amount);
            let amount_out = median.convert(amount_in)?;
            self.adjust_balance(&request.owner, amount_out)?;
            self.modify_global(|g| {
                g.current_supply += amount_out.amount;
                g.current_sbd_supply -= amount_in.amount;
            })?;
            self.push_virtual_operation(FillConvertRequestOperation {
                owner: request.owner,
                requestid: request.requestid,
                amount_in,
                amount_out,
            })?;
        }
        Ok(())
    }

    /// Splits the reward fund among content by listening seconds of the
    /// last 24 hours, once per payout interval.
    fn pay_content_rewards(&mut self, now: Timestamp) -> ChainResult<()> {
        let global = self.global()?;
        if now < global.last_content_payout.saturating_add(CONTENT_PAYOUT_INTERVAL) {
            return Ok(());
        }
        let fund = global.total_reward_fund;
        let block_num = global.head_block_number;

        let listened: Vec<_> = self
            .store
            .table::<Content>()
            .iter()
            .filter(|c| !c.disabled && c.total_listening_time_24 > 0)
            .map(|c| (c.id, c.uploader.clone(), c.url.clone(), c.total_listening_time_24))
            .collect();
        let total: u128 = listened.iter().map(|(_, _, _, secs)| u128::from(*secs)).sum();

        let mut paid = 0i64;
        if fund > 0 && total > 0 {
            for (id, uploader, url, secs) in listened {
                let share = u128::try_from(fund).unwrap_or(0) * u128::from(secs) / total;
                let share = i64::try_from(share).unwrap_or(0);
                if share == 0 {
                    continue;
                }
                self.adjust_balance(&uploader, Asset::core(share))?;
                self.store.modify(id, |c| c.accumulated_payout += share)?;
                paid += share;
                self.push_virtual_operation(ContentRewardOperation {
                    uploader,
                    url,
                    payout: Asset::core(share),
                })?;
            }
        }

        self.modify_global(|g| {
            g.total_reward_fund -= paid;
            g.last_content_payout = now;
        })?;
        log_block_event!(
            debug,
            "maintenance",
            "content rewards paid",
            block_num,
            now,
            paid = paid
        );
        Ok(())
    }
}
