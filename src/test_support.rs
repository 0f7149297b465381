use tokio::sync::Mutex as AsyncMutex;

/// Held by every test that sets or clears `INSIGHTFORGE_*` variables, since
/// the process environment is shared across test threads. Sync tests take it
/// with `.blocking_lock()`.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());
