//! Liquid, stable and vesting balance movements.

use super::Database;
use crate::domain::{ChainError, ChainResult};
use crate::{chain_ensure, structural_ensure};
use shared_types::constants::{PERCENT_100, SBD_INTEREST_COMPOUND_INTERVAL_SEC, SECONDS_PER_YEAR};
use shared_types::{AccountName, Asset, AssetSymbol, InterestOperation};

impl Database {
    /// Adds `delta` to the liquid or stable balance of `name`. Fails if the
    /// balance would go negative.
    pub(crate) fn adjust_balance(&mut self, name: &AccountName, delta: Asset) -> ChainResult<()> {
        match delta.symbol {
            AssetSymbol::Core => {
                let balance = self.get_account(name)?.balance;
                chain_ensure!(
                    balance + delta.amount >= 0,
                    "{} has insufficient balance: {} available, {} required",
                    name,
                    Asset::core(balance),
                    Asset::core(-delta.amount)
                );
                self.modify_account(name, |a| a.balance += delta.amount)
            }
            AssetSymbol::Stable => self.adjust_sbd_balance(name, delta.amount),
            AssetSymbol::Vests => Err(ChainError::StructuralError(format!(
                "{delta} cannot be added to a liquid balance"
            ))),
        }
    }

    /// Moves the stable balance, first accruing interest on the previous
    /// balance and paying it out once the compounding interval has passed.
    fn adjust_sbd_balance(&mut self, name: &AccountName, delta: i64) -> ChainResult<()> {
        let global = self.global()?;
        let (now, rate) = (global.head_block_time, global.sbd_interest_rate);
        let account = self.get_account(name)?;

        let mut sbd_seconds = account.sbd_seconds;
        let elapsed = now.saturating_sub(account.sbd_seconds_last_update);
        if elapsed > 0 {
            let balance = u128::try_from(account.sbd_balance).unwrap_or(0);
            sbd_seconds += balance * u128::from(elapsed);
        }

        let mut interest = 0i64;
        let mut last_payment = account.sbd_last_interest_payment;
        if sbd_seconds > 0 && now.saturating_sub(last_payment) > SBD_INTEREST_COMPOUND_INTERVAL_SEC {
            let yearly = sbd_seconds / u128::from(SECONDS_PER_YEAR);
            let owed = yearly * u128::from(rate) / u128::from(PERCENT_100);
            interest = i64::try_from(owed).unwrap_or(i64::MAX);
            sbd_seconds = 0;
            last_payment = now;
        }

        let available = account.sbd_balance + interest;
        chain_ensure!(
            available + delta >= 0,
            "{} has insufficient stable balance: {} available, {} required",
            name,
            Asset::stable(available),
            Asset::stable(-delta)
        );

        self.modify_account(name, |a| {
            a.sbd_seconds = sbd_seconds;
            a.sbd_seconds_last_update = now;
            a.sbd_last_interest_payment = last_payment;
            a.sbd_balance = available + delta;
        })?;

        if interest > 0 {
            self.modify_global(|g| g.current_sbd_supply += interest)?;
            self.push_virtual_operation(InterestOperation {
                owner: name.clone(),
                interest: Asset::stable(interest),
            })?;
        }
        Ok(())
    }

    /// Moves `core` liquid units into the vesting fund on behalf of `name`.
    /// The caller has already debited or minted them. Returns the shares issued.
    pub(crate) fn create_vesting(&mut self, name: &AccountName, core: i64) -> ChainResult<i64> {
        structural_ensure!(core >= 0, "cannot vest negative amount {}", core);
        let vests = self.global()?.core_to_vests(core);
        self.modify_global(|g| {
            g.total_vesting_fund += core;
            g.total_vesting_shares += vests;
        })?;
        self.adjust_vesting_shares(name, vests)?;
        Ok(vests)
    }

    /// Changes own vesting shares, carrying the change through witness vote
    /// weight and score.
    pub(crate) fn adjust_vesting_shares(&mut self, name: &AccountName, delta: i64) -> ChainResult<()> {
        if delta == 0 {
            return Ok(());
        }
        self.modify_account(name, |a| a.vesting_shares += delta)?;
        self.adjust_proxied_witness_votes(name, delta)?;
        self.recalculate_score(name)
    }

    /// Debits a fee from `payer` into the content reward fund.
    pub(crate) fn pay_to_reward_fund(&mut self, payer: &AccountName, fee: i64) -> ChainResult<()> {
        if fee == 0 {
            return Ok(());
        }
        self.adjust_balance(payer, Asset::core(-fee))?;
        self.modify_global(|g| g.total_reward_fund += fee)
    }
}
