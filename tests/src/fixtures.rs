//! Shared setup for the integration tests and benchmarks.

use cz_02_chain_state::{Account, ChainConfig, ChainResult, Database, SessionPhase};
use shared_types::constants::BLOCK_INTERVAL;
use shared_types::{
    AccountCreateOperation, AccountName, Asset, Authority, BlockHeader, Operation, PublicKey,
    SignedTransaction, Timestamp, TransferOperation,
};

/// Fee paid for every account created through [`TestChain::create_account`].
pub const ACCOUNT_FEE: i64 = 1_000;

/// Vesting shares issued per core unit while the vesting fund is untouched.
pub const VESTS_PER_CORE: i64 = 1_000;

pub fn key(name: &str) -> PublicKey {
    let body: String = name.chars().filter(char::is_ascii_alphanumeric).collect();
    PublicKey::from(format!("CDZ{body}").as_str())
}

pub fn name(name: &str) -> AccountName {
    AccountName::from(name)
}

/// A chain at genesis with blocks produced by the init account.
pub struct TestChain {
    pub db: Database,
}

impl Default for TestChain {
    fn default() -> Self {
        Self::new()
    }
}

impl TestChain {
    pub fn new() -> Self {
        Self::with_config(ChainConfig::default())
    }

    pub fn with_config(config: ChainConfig) -> Self {
        Self {
            db: Database::open(config).expect("genesis"),
        }
    }

    pub fn init(&self) -> AccountName {
        self.db.config().init_account.clone()
    }

    pub fn now(&self) -> Timestamp {
        self.db.head_block_time().expect("global properties")
    }

    pub fn head(&self) -> u64 {
        self.db.head_block_num().expect("global properties")
    }

    pub fn next_header(&self, interval: u64) -> BlockHeader {
        BlockHeader {
            number: self.head() + 1,
            timestamp: self.now() + interval,
            witness: self.init(),
        }
    }

    /// Applies `ops` as one transaction in a new block. The block commits
    /// even if the transaction is rejected; the transaction's result is
    /// returned.
    pub fn push(&mut self, ops: Vec<Operation>) -> ChainResult<()> {
        self.push_after(BLOCK_INTERVAL, ops)
    }

    /// Like [`push`](Self::push), with the block `interval` seconds after head.
    pub fn push_after(&mut self, interval: u64, ops: Vec<Operation>) -> ChainResult<()> {
        let header = self.next_header(interval);
        self.db.begin_block_session(&header)?;
        let tx = SignedTransaction::new(header.timestamp + 3_600, ops);
        let result = self.db.push_transaction(&tx);
        if self.db.phase() == SessionPhase::Block {
            self.db.commit_block()?;
        }
        result
    }

    /// Produces one empty block `seconds` after head.
    pub fn skip_time(&mut self, seconds: u64) {
        let header = self.next_header(seconds);
        self.db.begin_block_session(&header).expect("open block");
        self.db.commit_block().expect("commit empty block");
    }

    pub fn produce_blocks(&mut self, count: u64) {
        for _ in 0..count {
            self.skip_time(BLOCK_INTERVAL);
        }
    }

    /// Creates `new_name` from the init account.
    pub fn create_account(&mut self, new_name: &str) -> AccountName {
        let op = account_create(&self.init(), new_name);
        self.push(vec![op]).expect("account create");
        name(new_name)
    }

    pub fn fund(&mut self, to: &AccountName, core: i64) {
        let op = transfer(&self.init(), to, Asset::core(core));
        self.push(vec![op]).expect("funding transfer");
    }

    pub fn account(&self, account: &str) -> Account {
        self.db
            .get_account(&name(account))
            .expect("account exists")
            .clone()
    }
}

/// Account creation paying [`ACCOUNT_FEE`], with a key authority derived
/// from the name.
pub fn account_create(creator: &AccountName, new_name: &str) -> Operation {
    let authority = Authority::key(key(new_name));
    AccountCreateOperation {
        fee: Asset::core(ACCOUNT_FEE),
        creator: creator.clone(),
        new_account_name: name(new_name),
        owner: authority.clone(),
        active: authority.clone(),
        basic: authority,
        memo_key: key(new_name),
        json_metadata: String::new(),
    }
    .into()
}

pub fn transfer(from: &AccountName, to: &AccountName, amount: Asset) -> Operation {
    TransferOperation {
        from: from.clone(),
        to: to.clone(),
        amount,
        memo: String::new(),
    }
    .into()
}
