//! Setup Cache - 경로별 파이프라인 설정 메모이제이션
//!
//! 같은 키로 처음 동시에 들어온 요청도 초기화는 한 번만 실행됩니다.
//! 실패한 초기화는 저장하지 않으므로 다음 요청에서 다시 시도합니다.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use tokio::sync::OnceCell;

/// 경로 → 설정 결과 캐시
pub struct SetupCache<T> {
    cells: Mutex<HashMap<PathBuf, Arc<OnceCell<Arc<T>>>>>,
}

impl<T> Default for SetupCache<T> {
    fn default() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> SetupCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 캐시된 값을 반환하거나 `init`으로 만들어 저장
    pub async fn get_or_try_init<F, Fut>(&self, key: &Path, init: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let cell = self.cell(key);
        let value = cell
            .get_or_try_init(|| async {
                tracing::info!("Initializing cached pipeline for {:?}", key);
                init().await.map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(value))
    }

    /// 이미 초기화된 값
    pub fn get(&self, key: &Path) -> Option<Arc<T>> {
        let cells = self.cells.lock().ok()?;
        cells.get(key).and_then(|cell| cell.get().cloned())
    }

    fn cell(&self, key: &Path) -> Arc<OnceCell<Arc<T>>> {
        // 잠금은 셀 조회에만 사용하고 await 동안 잡지 않음
        let mut cells = match self.cells.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        cells
            .entry(key.to_path_buf())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }
}

// ============================================================================
// Tests
// ============================================================================
