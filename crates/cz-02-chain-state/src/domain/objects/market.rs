use super::{type_ids, IMPLEMENTATION_SPACE, PROTOCOL_SPACE};
use cz_01_object_store::{Id, IndexSpec, Object, Table};
use serde::Serialize;
use shared_types::{AccountName, Asset, AssetSymbol, Price, PriceRatio, ProtocolError, Timestamp};
use std::cmp::Reverse;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimitOrder {
    pub id: Id<LimitOrder>,
    pub owner: AccountName,
    pub orderid: u32,
    pub created: Timestamp,
    pub expiration: Timestamp,
    /// Amount of `sell_price.base` still on offer
    pub for_sale: i64,
    pub sell_price: Price,
}

impl LimitOrder {
    pub fn amount_for_sale(&self) -> Asset {
        Asset::new(self.for_sale, self.sell_price.base.symbol)
    }

    pub fn amount_to_receive(&self) -> Result<Asset, ProtocolError> {
        self.sell_price.convert(self.amount_for_sale())
    }
}

impl Object for LimitOrder {
    const SPACE_ID: u8 = PROTOCOL_SPACE;
    const TYPE_ID: u8 = type_ids::LIMIT_ORDER;
    const TYPE_NAME: &'static str = "limit_order";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn register_indices(table: &mut Table<Self>) {
        table.add_index::<OrderByAccount>();
        table.add_index::<OrderByPrice>();
        table.add_index::<OrderByExpiration>();
    }
}

pub struct OrderByAccount;

impl IndexSpec<LimitOrder> for OrderByAccount {
    type Key = (AccountName, u32);
    const NAME: &'static str = "by_account";
    const UNIQUE: bool = true;

    fn key(obj: &LimitOrder) -> Self::Key {
        (obj.owner.clone(), obj.orderid)
    }
}

/// Book side `(sells, receives)`, cheapest offer (most sold per unit
/// received) first.
pub struct OrderByPrice;

impl IndexSpec<LimitOrder> for OrderByPrice {
    type Key = (AssetSymbol, AssetSymbol, Reverse<PriceRatio>);
    const NAME: &'static str = "by_price";

    fn key(obj: &LimitOrder) -> Self::Key {
        (
            obj.sell_price.base.symbol,
            obj.sell_price.quote.symbol,
            Reverse(obj.sell_price.ratio()),
        )
    }
}

pub struct OrderByExpiration;

impl IndexSpec<LimitOrder> for OrderByExpiration {
    type Key = Timestamp;
    const NAME: &'static str = "by_expiration";

    fn key(obj: &LimitOrder) -> Timestamp {
        obj.expiration
    }
}

/// Stable balance queued for conversion to the core asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertRequest {
    pub id: Id<ConvertRequest>,
    pub owner: AccountName,
    pub requestid: u32,
    pub amount: i64,
    pub conversion_date: Timestamp,
}

impl Object for ConvertRequest {
    const SPACE_ID: u8 = IMPLEMENTATION_SPACE;
    const TYPE_ID: u8 = type_ids::CONVERT_REQUEST;
    const TYPE_NAME: &'static str = "convert_request";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn register_indices(table: &mut Table<Self>) {
        table.add_index::<ConvertByOwner>();
        table.add_index::<ConvertByDate>();
    }
}

pub struct ConvertByOwner;

impl IndexSpec<ConvertRequest> for ConvertByOwner {
    type Key = (AccountName, u32);
    const NAME: &'static str = "by_owner";
    const UNIQUE: bool = true;

    fn key(obj: &ConvertRequest) -> Self::Key {
        (obj.owner.clone(), obj.requestid)
    }
}

pub struct ConvertByDate;

impl IndexSpec<ConvertRequest> for ConvertByDate {
    type Key = Timestamp;
    const NAME: &'static str = "by_conversion_date";

    fn key(obj: &ConvertRequest) -> Timestamp {
        obj.conversion_date
    }
}
