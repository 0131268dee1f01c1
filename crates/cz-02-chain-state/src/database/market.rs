//! Order matching between the core and stable assets.
//!
//! A new order is matched against the opposite side of the book, best offer
//! first, always at the resting order's price. Remainders too small to buy a
//! single unit are refunded.

use super::Database;
use crate::domain::*;
use crate::structural_ensure;
use cz_01_object_store::Id;
use shared_types::{FillOrderOperation, PriceRatio, Timestamp};
use std::cmp::Reverse;

impl Database {
    /// Matches a freshly created order. Returns `true` if it was completely
    /// filled (or refunded as dust) and no longer rests on the book.
    pub(crate) fn apply_order(&mut self, id: Id<LimitOrder>) -> ChainResult<bool> {
        loop {
            let Some(taker) = self.store.find(id).cloned() else {
                return Ok(true);
            };
            let sells = taker.sell_price.base.symbol;
            let receives = taker.sell_price.quote.symbol;
            let best = (receives, sells, Reverse(PriceRatio::new(i64::MAX, 1)));
            let worst = (receives, sells, Reverse(PriceRatio::new(0, 1)));

            let Some(maker) = self
                .store
                .range_by::<LimitOrder, OrderByPrice, _>(best..=worst)
                .next()
                .cloned()
            else {
                break;
            };

            // maker offers `maker.base` for `maker.quote`; the taker accepts
            // anything at least as good as `taker.quote` per `taker.base`
            let crosses = i128::from(maker.sell_price.base.amount) * i128::from(taker.sell_price.base.amount)
                >= i128::from(maker.sell_price.quote.amount) * i128::from(taker.sell_price.quote.amount);
            if !crosses {
                break;
            }
            self.match_orders(&taker, &maker)?;
        }
        Ok(self.store.find(id).is_none())
    }

    fn match_orders(&mut self, taker: &LimitOrder, maker: &LimitOrder) -> ChainResult<()> {
        let price = maker.sell_price;
        let taker_for_sale = taker.amount_for_sale();
        let maker_for_sale = maker.amount_for_sale();

        let taker_could_receive = price.convert(taker_for_sale)?;
        let (taker_receives, maker_receives) = if taker_could_receive.amount > maker_for_sale.amount {
            (maker_for_sale, price.convert(maker_for_sale)?)
        } else {
            (taker_could_receive, taker_for_sale)
        };

        if taker_receives.amount == 0 {
            return self.cancel_order(taker.id);
        }
        if maker_receives.amount == 0 {
            return self.cancel_order(maker.id);
        }

        self.fill_order(taker.id, maker_receives, taker_receives)?;
        self.fill_order(maker.id, taker_receives, maker_receives)?;
        self.push_virtual_operation(FillOrderOperation {
            current_owner: taker.owner.clone(),
            current_orderid: taker.orderid,
            current_pays: maker_receives,
            open_owner: maker.owner.clone(),
            open_orderid: maker.orderid,
            open_pays: taker_receives,
        })
    }

    /// Settles one side of a match: the order gives up `pays` and its owner
    /// is credited `receives`.
    fn fill_order(
        &mut self,
        id: Id<LimitOrder>,
        pays: shared_types::Asset,
        receives: shared_types::Asset,
    ) -> ChainResult<()> {
        let order = self.store.get(id)?;
        structural_ensure!(
            pays.symbol == order.sell_price.base.symbol && pays.amount <= order.for_sale,
            "order {} cannot pay {} from {}",
            id,
            pays,
            order.amount_for_sale()
        );
        let owner = order.owner.clone();
        let exhausted = pays.amount == order.for_sale;

        self.adjust_balance(&owner, receives)?;
        if exhausted {
            self.store.remove(id)?;
            return Ok(());
        }
        self.store.modify(id, |o| o.for_sale -= pays.amount)?;

        if self.store.get(id)?.amount_to_receive()?.amount == 0 {
            self.cancel_order(id)?;
        }
        Ok(())
    }

    /// Removes an order and refunds what is left of it.
    pub(crate) fn cancel_order(&mut self, id: Id<LimitOrder>) -> ChainResult<()> {
        let order = self.store.remove(id)?;
        self.adjust_balance(&order.owner, order.amount_for_sale())
    }

    pub(crate) fn clear_expired_orders(&mut self, now: Timestamp) -> ChainResult<()> {
        let expired: Vec<_> = self
            .store
            .range_by::<LimitOrder, OrderByExpiration, _>(..=now)
            .map(|o| o.id)
            .collect();
        for id in expired {
            self.cancel_order(id)?;
        }
        Ok(())
    }
}
