//! SQLite-backed storage.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use log::debug;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};

use super::{MAX_STORED_AMOUNT, Storage};
use crate::blockchain::Block;
use crate::error::{ChainError, Result};
use crate::ledger::Account;
use crate::transaction::TransferRecord;

const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS blocks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        index_num INTEGER NOT NULL UNIQUE,
        hash TEXT NOT NULL,
        prev_hash TEXT NOT NULL,
        data TEXT NOT NULL,
        timestamp INTEGER NOT NULL,
        nonce INTEGER NOT NULL,
        difficulty INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS wallets (
        address TEXT PRIMARY KEY,
        balance INTEGER NOT NULL DEFAULT 0
            CHECK (typeof(balance) = 'integer' AND balance >= 0),
        private_key TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        block_id INTEGER REFERENCES blocks(id),
        from_addr TEXT NOT NULL,
        to_addr TEXT NOT NULL,
        amount INTEGER NOT NULL CHECK (amount > 0),
        timestamp INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_transactions_block ON transactions(block_id);
";

const BLOCK_COLUMNS: &str = "id, index_num, hash, prev_hash, data, timestamp, nonce, difficulty";
const TRANSFER_COLUMNS: &str = "id, block_id, from_addr, to_addr, amount, timestamp";

/// One shared connection; every operation holds the lock only for its own
/// duration, so the guard is always released when the call returns.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| ChainError::persistence("open", e))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| ChainError::persistence("open", e))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| ChainError::persistence("create_schema", e))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self, op: &'static str) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ChainError::persistence(op, "connection mutex poisoned"))
    }

    fn query_blocks(&self, op: &'static str, sql: &str) -> Result<Vec<Block>> {
        let conn = self.lock(op)?;
        let mut stmt = conn.prepare(sql).map_err(|e| ChainError::persistence(op, e))?;
        let rows = stmt
            .query_map([], block_from_row)
            .map_err(|e| ChainError::persistence(op, e))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| ChainError::persistence(op, e))
    }

    fn query_transfers<P: rusqlite::Params>(
        &self,
        op: &'static str,
        sql: &str,
        params: P,
    ) -> Result<Vec<TransferRecord>> {
        let conn = self.lock(op)?;
        let mut stmt = conn.prepare(sql).map_err(|e| ChainError::persistence(op, e))?;
        let rows = stmt
            .query_map(params, transfer_from_row)
            .map_err(|e| ChainError::persistence(op, e))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| ChainError::persistence(op, e))
    }
}

fn block_from_row(row: &Row<'_>) -> rusqlite::Result<Block> {
    Ok(Block {
        id: Some(row.get(0)?),
        index: row.get::<_, i64>(1)? as u64,
        hash: row.get(2)?,
        previous_hash: row.get(3)?,
        data: row.get(4)?,
        timestamp: row.get(5)?,
        nonce: row.get::<_, i64>(6)? as u64,
        difficulty: row.get::<_, i64>(7)? as u32,
    })
}

fn transfer_from_row(row: &Row<'_>) -> rusqlite::Result<TransferRecord> {
    Ok(TransferRecord {
        id: Some(row.get(0)?),
        block_id: row.get(1)?,
        from_address: row.get(2)?,
        to_address: row.get(3)?,
        amount: row.get::<_, i64>(4)? as u64,
        timestamp: row.get(5)?,
    })
}

fn balance_of(conn: &Connection, address: &str) -> rusqlite::Result<Option<u64>> {
    conn.query_row(
        "SELECT balance FROM wallets WHERE address = ?1",
        params![address],
        |row| row.get::<_, i64>(0),
    )
    .optional()
    .map(|b| b.map(|b| b as u64))
}

/// `balance + amount`, or `BalanceOverflow` when it leaves the storable range.
fn checked_credit(address: &str, balance: u64, amount: u64) -> Result<u64> {
    balance
        .checked_add(amount)
        .filter(|&sum| sum <= MAX_STORED_AMOUNT)
        .ok_or_else(|| ChainError::BalanceOverflow {
            address: address.to_string(),
            max: MAX_STORED_AMOUNT,
        })
}

fn insert_transfer(conn: &Connection, record: &TransferRecord) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO transactions (block_id, from_addr, to_addr, amount, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            record.block_id,
            record.from_address,
            record.to_address,
            record.amount as i64,
            record.timestamp,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

impl Storage for SqliteStorage {
    fn save_block(&self, block: &Block) -> Result<i64> {
        let conn = self.lock("save_block")?;
        conn.execute(
            "INSERT INTO blocks (index_num, hash, prev_hash, data, timestamp, nonce, difficulty)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                block.index as i64,
                block.hash,
                block.previous_hash,
                block.data,
                block.timestamp,
                block.nonce as i64,
                block.difficulty as i64,
            ],
        )
        .map_err(|e| ChainError::persistence("save_block", e))?;
        let id = conn.last_insert_rowid();
        debug!("STORAGE - saved block #{} as row {}", block.index, id);
        Ok(id)
    }

    fn get_block_by_index(&self, index: u64) -> Result<Option<Block>> {
        let conn = self.lock("get_block_by_index")?;
        conn.query_row(
            &format!("SELECT {BLOCK_COLUMNS} FROM blocks WHERE index_num = ?1"),
            params![index as i64],
            block_from_row,
        )
        .optional()
        .map_err(|e| ChainError::persistence("get_block_by_index", e))
    }

    fn get_latest_block(&self) -> Result<Option<Block>> {
        let conn = self.lock("get_latest_block")?;
        conn.query_row(
            &format!("SELECT {BLOCK_COLUMNS} FROM blocks ORDER BY index_num DESC LIMIT 1"),
            [],
            block_from_row,
        )
        .optional()
        .map_err(|e| ChainError::persistence("get_latest_block", e))
    }

    fn get_all_blocks(&self) -> Result<Vec<Block>> {
        self.query_blocks(
            "get_all_blocks",
            &format!("SELECT {BLOCK_COLUMNS} FROM blocks ORDER BY index_num ASC"),
        )
    }

    fn save_account(&self, account: &Account) -> Result<()> {
        let conn = self.lock("save_account")?;
        conn.execute(
            "INSERT INTO wallets (address, balance, private_key, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                account.address,
                account.balance as i64,
                account.private_key,
                account.created_at,
            ],
        )
        .map_err(|e| ChainError::persistence("save_account", e))?;
        Ok(())
    }

    fn account_exists(&self, address: &str) -> Result<bool> {
        let conn = self.lock("account_exists")?;
        conn.query_row(
            "SELECT 1 FROM wallets WHERE address = ?1",
            params![address],
            |_| Ok(()),
        )
        .optional()
        .map(|found| found.is_some())
        .map_err(|e| ChainError::persistence("account_exists", e))
    }

    fn get_balance(&self, address: &str) -> Result<u64> {
        let conn = self.lock("get_balance")?;
        balance_of(&conn, address)
            .map_err(|e| ChainError::persistence("get_balance", e))?
            .ok_or_else(|| ChainError::AccountNotFound(address.to_string()))
    }

    fn credit_balance(&self, address: &str, amount: u64) -> Result<u64> {
        let op = "credit_balance";
        let mut conn = self.lock(op)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| ChainError::persistence(op, e))?;

        let balance = balance_of(&tx, address)
            .map_err(|e| ChainError::persistence(op, e))?
            .ok_or_else(|| ChainError::AccountNotFound(address.to_string()))?;
        let updated = checked_credit(address, balance, amount)?;

        tx.execute(
            "UPDATE wallets SET balance = ?1 WHERE address = ?2",
            params![updated as i64, address],
        )
        .map_err(|e| ChainError::persistence(op, e))?;
        tx.commit().map_err(|e| ChainError::persistence(op, e))?;
        Ok(updated)
    }

    fn transfer_atomically(&self, record: &TransferRecord) -> Result<TransferRecord> {
        let op = "transfer";
        let mut conn = self.lock(op)?;
        // Dropping `tx` without commit rolls everything back.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| ChainError::persistence(op, e))?;

        let balance = balance_of(&tx, &record.from_address)
            .map_err(|e| ChainError::persistence(op, e))?
            .ok_or_else(|| ChainError::AccountNotFound(record.from_address.clone()))?;

        if balance < record.amount {
            return Err(ChainError::InsufficientFunds {
                address: record.from_address.clone(),
                balance,
                requested: record.amount,
            });
        }

        tx.execute(
            "UPDATE wallets SET balance = balance - ?1 WHERE address = ?2",
            params![record.amount as i64, record.from_address],
        )
        .map_err(|e| ChainError::persistence(op, e))?;

        // Read after the debit so a self-transfer sees its own debit.
        let recipient = balance_of(&tx, &record.to_address)
            .map_err(|e| ChainError::persistence(op, e))?
            .ok_or_else(|| ChainError::AccountNotFound(record.to_address.clone()))?;
        let credited = checked_credit(&record.to_address, recipient, record.amount)?;

        tx.execute(
            "UPDATE wallets SET balance = ?1 WHERE address = ?2",
            params![credited as i64, record.to_address],
        )
        .map_err(|e| ChainError::persistence(op, e))?;

        let id = insert_transfer(&tx, record).map_err(|e| ChainError::persistence(op, e))?;
        tx.commit().map_err(|e| ChainError::persistence(op, e))?;

        Ok(TransferRecord {
            id: Some(id),
            ..record.clone()
        })
    }

    fn count_accounts(&self) -> Result<u64> {
        let conn = self.lock("count_accounts")?;
        conn.query_row("SELECT COUNT(*) FROM wallets", [], |row| row.get::<_, i64>(0))
            .map(|n| n as u64)
            .map_err(|e| ChainError::persistence("count_accounts", e))
    }

    fn save_transfer_record(&self, record: &TransferRecord) -> Result<i64> {
        let conn = self.lock("save_transfer_record")?;
        insert_transfer(&conn, record).map_err(|e| ChainError::persistence("save_transfer_record", e))
    }

    fn get_transfer_records_by_block_id(&self, block_id: i64) -> Result<Vec<TransferRecord>> {
        self.query_transfers(
            "get_transfer_records_by_block_id",
            &format!("SELECT {TRANSFER_COLUMNS} FROM transactions WHERE block_id = ?1 ORDER BY id"),
            params![block_id],
        )
    }

    fn get_transfer_records_by_address(&self, address: &str) -> Result<Vec<TransferRecord>> {
        self.query_transfers(
            "get_transfer_records_by_address",
            &format!(
                "SELECT {TRANSFER_COLUMNS} FROM transactions
                 WHERE from_addr = ?1 OR to_addr = ?1
                 ORDER BY timestamp DESC, id DESC"
            ),
            params![address],
        )
    }

    fn get_transfer_records_page(&self, limit: u32, offset: u64) -> Result<Vec<TransferRecord>> {
        self.query_transfers(
            "get_transfer_records_page",
            &format!(
                "SELECT {TRANSFER_COLUMNS} FROM transactions
                 ORDER BY timestamp DESC, id DESC LIMIT ?1 OFFSET ?2"
            ),
            params![limit as i64, offset as i64],
        )
    }

    fn count_transfer_records(&self) -> Result<u64> {
        let conn = self.lock("count_transfer_records")?;
        conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|n| n as u64)
        .map_err(|e| ChainError::persistence("count_transfer_records", e))
    }
}
