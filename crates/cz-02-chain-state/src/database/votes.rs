//! Witness and streaming platform vote weight.
//!
//! An account's weight is its own vesting plus whatever is proxied to it.
//! Accounts with a proxy have no votes of their own; their weight is carried
//! up to `MAX_PROXY_RECURSION_DEPTH` hops and recorded in each proxy's
//! `proxied_vsf_votes[hop - 1]`.

use super::Database;
use crate::domain::*;
use shared_types::constants::MAX_PROXY_RECURSION_DEPTH;
use shared_types::AccountName;

/// Own vesting followed by the vesting proxied from 1..=MAX hops away.
pub(crate) type ProxyDelta = [i64; MAX_PROXY_RECURSION_DEPTH + 1];

impl Database {
    /// Carries a change of `name`'s own vesting to whoever votes with it.
    pub(crate) fn adjust_proxied_witness_votes(&mut self, name: &AccountName, delta: i64) -> ChainResult<()> {
        let mut current = name.clone();
        for depth in 0..=MAX_PROXY_RECURSION_DEPTH {
            let Some(proxy) = self.get_account(&current)?.proxy.clone() else {
                return self.adjust_witness_votes(&current, delta);
            };
            if depth >= MAX_PROXY_RECURSION_DEPTH {
                break;
            }
            self.modify_account(&proxy, |p| p.proxied_vsf_votes[depth] += delta)?;
            current = proxy;
        }
        Ok(())
    }

    /// Carries a change of `name`'s whole weight (own vesting and proxied
    /// layers) up its proxy chain.
    pub(crate) fn adjust_proxied_witness_votes_layers(
        &mut self,
        name: &AccountName,
        delta: &ProxyDelta,
    ) -> ChainResult<()> {
        let mut current = name.clone();
        for depth in 0..=MAX_PROXY_RECURSION_DEPTH {
            let Some(proxy) = self.get_account(&current)?.proxy.clone() else {
                let total: i64 = delta[..=MAX_PROXY_RECURSION_DEPTH - depth].iter().sum();
                return self.adjust_witness_votes(&current, total);
            };
            if depth >= MAX_PROXY_RECURSION_DEPTH {
                break;
            }
            self.modify_account(&proxy, |p| {
                for (i, d) in delta.iter().take(MAX_PROXY_RECURSION_DEPTH - depth).enumerate() {
                    p.proxied_vsf_votes[i + depth] += d;
                }
            })?;
            current = proxy;
        }
        Ok(())
    }

    /// Applies `delta` to every witness and platform `name` votes for.
    pub(crate) fn adjust_witness_votes(&mut self, name: &AccountName, delta: i64) -> ChainResult<()> {
        if delta == 0 {
            return Ok(());
        }
        let witnesses: Vec<AccountName> = self
            .store
            .table::<WitnessVote>()
            .equal_range::<WitnessVoteByAccount>(name)
            .map(|v| v.witness.clone())
            .collect();
        for witness in witnesses {
            let id = self.get_witness(&witness)?.id;
            self.store.modify(id, |w| w.votes += delta)?;
        }

        let platforms: Vec<AccountName> = self
            .store
            .table::<StreamingPlatformVote>()
            .equal_range::<PlatformVoteByAccount>(name)
            .map(|v| v.streaming_platform.clone())
            .collect();
        for platform in platforms {
            self.modify_streaming_platform(&platform, |p| p.votes += delta)?;
        }
        Ok(())
    }

    /// Drops all witness and platform votes of `name` without touching
    /// vote totals. Callers remove the weight first.
    pub(crate) fn clear_witness_votes(&mut self, name: &AccountName) -> ChainResult<()> {
        let witness_votes: Vec<_> = self
            .store
            .table::<WitnessVote>()
            .equal_range::<WitnessVoteByAccount>(name)
            .map(|v| v.id)
            .collect();
        for id in witness_votes {
            self.store.remove(id)?;
        }

        let platform_votes: Vec<_> = self
            .store
            .table::<StreamingPlatformVote>()
            .equal_range::<PlatformVoteByAccount>(name)
            .map(|v| v.id)
            .collect();
        for id in platform_votes {
            self.store.remove(id)?;
        }

        self.modify_account(name, |a| {
            a.witnesses_voted_for = 0;
            a.streaming_platforms_voted_for = 0;
        })
    }
}
