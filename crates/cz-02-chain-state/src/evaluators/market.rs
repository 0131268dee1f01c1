use super::define_evaluator;
use crate::chain_ensure;
use crate::database::Database;
use crate::domain::*;
use shared_types::{Asset, ConvertOperation, LimitOrderCancelOperation, LimitOrderCreateOperation};

define_evaluator!(LimitOrderCreateEvaluator, LimitOrderCreate, LimitOrderCreateOperation, limit_order_create);
define_evaluator!(LimitOrderCancelEvaluator, LimitOrderCancel, LimitOrderCancelOperation, limit_order_cancel);
define_evaluator!(ConvertEvaluator, Convert, ConvertOperation, convert);

fn limit_order_create(db: &mut Database, op: &LimitOrderCreateOperation) -> ChainResult<()> {
    let now = db.head_block_time()?;
    chain_ensure!(
        op.expiration > now,
        "order expiration {} is not after head block time {}",
        op.expiration,
        now
    );
    chain_ensure!(
        db.find_limit_order(&op.owner, op.orderid).is_none(),
        "{} already has an order {}",
        op.owner,
        op.orderid
    );

    let sell = op.amount_to_sell;
    db.adjust_balance(&op.owner, Asset::new(-sell.amount, sell.symbol))?;
    let id = db.store_mut().create(|id| LimitOrder {
        id,
        owner: op.owner.clone(),
        orderid: op.orderid,
        created: now,
        expiration: op.expiration,
        for_sale: sell.amount,
        sell_price: op.sell_price(),
    })?;

    let filled = db.apply_order(id)?;
    chain_ensure!(
        !op.fill_or_kill || filled,
        "fill-or-kill order {}/{} was not completely filled",
        op.owner,
        op.orderid
    );
    Ok(())
}

fn limit_order_cancel(db: &mut Database, op: &LimitOrderCancelOperation) -> ChainResult<()> {
    let id = db
        .find_limit_order(&op.owner, op.orderid)
        .map(|o| o.id)
        .ok_or_else(|| ChainError::not_found("limit order", format!("{}/{}", op.owner, op.orderid)))?;
    db.cancel_order(id)
}

fn convert(db: &mut Database, op: &ConvertOperation) -> ChainResult<()> {
    let now = db.head_block_time()?;
    let delay = db.config().conversion_delay;
    chain_ensure!(
        db.store()
            .find_by::<ConvertRequest, ConvertByOwner>(&(op.owner.clone(), op.requestid))
            .is_none(),
        "{} already has a conversion request {}",
        op.owner,
        op.requestid
    );

    db.adjust_balance(&op.owner, Asset::stable(-op.amount.amount))?;
    db.store_mut().create(|id| ConvertRequest {
        id,
        owner: op.owner.clone(),
        requestid: op.requestid,
        amount: op.amount.amount,
        conversion_date: now + delay,
    })?;
    Ok(())
}
