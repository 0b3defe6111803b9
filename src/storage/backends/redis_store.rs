use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

use crate::storage::core::{
    CommitOutcome, Cursor, KeyValueStore, Mutation, Precondition, ScanPage, StoreError,
    StoreResult, WriteBatch,
};

// ============================================================================
// Redis Store - Production KeyValueStore
// ============================================================================
//
// - Records are plain string values (SET / GET / MGET).
// - Sets are Redis sets, scanned with SSCAN.
// - A WriteBatch runs as a single Lua script, so the precondition check and
//   every mutation execute atomically on the server. The script type-checks
//   all targets before writing anything, since Redis does not roll back a
//   script that fails halfway.
//
// Script arguments:
// - KEYS: every key the batch touches, precondition key first.
// - ARGV[1]: "none" | "absent" | "present" (applies to KEYS[1]).
// - ARGV[2..]: triples of (op, key index into KEYS, payload).
//
// ============================================================================

const BATCH_SCRIPT: &str = r#"
local guard = ARGV[1]
if guard ~= 'none' then
  local exists = redis.call('EXISTS', KEYS[1]) == 1
  if (guard == 'absent' and exists) or (guard == 'present' and not exists) then
    return 0
  end
end

for i = 2, #ARGV, 3 do
  local op = ARGV[i]
  local key = KEYS[tonumber(ARGV[i + 1])]
  if op == 'sadd' or op == 'srem' then
    local kind = redis.call('TYPE', key).ok
    if kind ~= 'set' and kind ~= 'none' then
      return redis.error_reply('WRONGTYPE batch target ' .. key .. ' is not a set')
    end
  elseif op ~= 'put' and op ~= 'del' then
    return redis.error_reply('ERR unknown batch op ' .. op)
  end
end

for i = 2, #ARGV, 3 do
  local op = ARGV[i]
  local key = KEYS[tonumber(ARGV[i + 1])]
  local payload = ARGV[i + 2]
  if op == 'put' then
    redis.call('SET', key, payload)
  elseif op == 'del' then
    redis.call('DEL', key)
  elseif op == 'sadd' then
    redis.call('SADD', key, payload)
  else
    redis.call('SREM', key, payload)
  end
end
return 1
"#;

/// SSCAN cursor that both starts and ends an iteration.
const SCAN_SENTINEL: &str = "0";

#[derive(Debug, Default, PartialEq, Eq)]
struct ScriptArgs {
    keys: Vec<String>,
    argv: Vec<Vec<u8>>,
}

impl ScriptArgs {
    fn key_slot(&mut self, key: &str) -> usize {
        match self.keys.iter().position(|k| k == key) {
            Some(pos) => pos + 1,
            None => {
                self.keys.push(key.to_string());
                self.keys.len()
            }
        }
    }

    fn from_batch(batch: &WriteBatch) -> Self {
        let mut args = ScriptArgs::default();

        let guard = match batch.precondition() {
            Some(precondition) => {
                args.key_slot(precondition.key());
                match precondition {
                    Precondition::KeyAbsent(_) => "absent",
                    Precondition::KeyPresent(_) => "present",
                }
            }
            None => "none",
        };
        args.argv.push(guard.as_bytes().to_vec());

        for mutation in batch.mutations() {
            let slot = args.key_slot(mutation.target());
            let (op, payload): (&str, &[u8]) = match mutation {
                Mutation::Put { value, .. } => ("put", value.as_slice()),
                Mutation::Delete { .. } => ("del", b"".as_slice()),
                Mutation::SetAdd { member, .. } => ("sadd", member.as_bytes()),
                Mutation::SetRemove { member, .. } => ("srem", member.as_bytes()),
            };
            args.argv.push(op.as_bytes().to_vec());
            args.argv.push(slot.to_string().into_bytes());
            args.argv.push(payload.to_vec());
        }

        args
    }
}

/// SSCAN cursors are unsigned integers; anything else was not issued by us.
fn scan_start(cursor: Option<&Cursor>) -> StoreResult<&str> {
    match cursor {
        Some(cursor) if cursor.as_str().parse::<u64>().is_err() => {
            Err(StoreError::InvalidCursor(cursor.to_string()))
        }
        Some(cursor) => Ok(cursor.as_str()),
        None => Ok(SCAN_SENTINEL),
    }
}

fn next_cursor(raw: String) -> Option<Cursor> {
    if raw == SCAN_SENTINEL {
        None
    } else {
        Some(Cursor::new(raw))
    }
}

#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    batch_script: Script,
}

impl RedisStore {
    /// Connect to Redis at `url` (e.g. `redis://localhost:6379`).
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;

        tracing::info!(url = %url, "Connected to Redis");

        Ok(Self {
            conn,
            batch_script: Script::new(BATCH_SCRIPT),
        })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn get_many(&self, keys: &[String]) -> StoreResult<Vec<Option<Vec<u8>>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.conn.clone();
        let values: Vec<Option<Vec<u8>>> = redis::cmd("MGET").arg(keys).query_async(&mut conn).await?;
        Ok(values)
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<CommitOutcome> {
        let args = ScriptArgs::from_batch(&batch);

        let mut invocation = self.batch_script.prepare_invoke();
        for key in &args.keys {
            invocation.key(key);
        }
        for arg in &args.argv {
            invocation.arg(arg.as_slice());
        }

        let mut conn = self.conn.clone();
        let reply: i64 = invocation.invoke_async(&mut conn).await?;

        match reply {
            1 => Ok(CommitOutcome::Applied),
            0 => Ok(CommitOutcome::PreconditionFailed),
            other => Err(StoreError::Backend(format!(
                "unexpected batch script reply {}",
                other
            ))),
        }
    }

    async fn scan_set(
        &self,
        set: &str,
        cursor: Option<&Cursor>,
        count: usize,
    ) -> StoreResult<ScanPage> {
        let start = scan_start(cursor)?;

        let mut conn = self.conn.clone();
        let (raw_next, members): (String, Vec<String>) = redis::cmd("SSCAN")
            .arg(set)
            .arg(start)
            .arg("COUNT")
            .arg(count.max(1))
            .query_async(&mut conn)
            .await?;

        Ok(ScanPage {
            members,
            next: next_cursor(raw_next),
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
