//! Identity プール
//!
//! 固定長・順序付きの Identity の集合から、接続ごとに 1 つを貸し出します。
//! 返却された Identity はフリーリストに戻り、次の接続では最も小さい
//! インデックスの空きから割り当てられます。接続中の 2 つのセッションが
//! 同じ Identity を持つことはありません。

use std::collections::BTreeSet;

use super::{
    entity::Identity,
    error::DomainError,
    value_object::{DisplayName, UserId},
};

/// 既定のプール（`user1`/Alice, `user2`/Bob, `user3`/Charlie）の表示名
const REFERENCE_NAMES: [&str; 3] = ["Alice", "Bob", "Charlie"];

/// 固定長の Identity プール
#[derive(Debug, Clone)]
pub struct IdentityPool {
    entries: Vec<Identity>,
    /// 未割り当てのインデックス
    free: BTreeSet<usize>,
}

impl IdentityPool {
    /// 与えられた順序の Identity でプールを作成
    pub fn new(entries: Vec<Identity>) -> Self {
        let free = (0..entries.len()).collect();
        Self { entries, free }
    }

    /// 既定の 3 件のプール
    pub fn reference() -> Self {
        Self::with_size(REFERENCE_NAMES.len())
    }

    /// `size` 件のプールを作成
    ///
    /// 先頭 3 件は Alice, Bob, Charlie。それ以降は `userN` / `User N`。
    pub fn with_size(size: usize) -> Self {
        let entries = (1..=size)
            .filter_map(|n| {
                let name = REFERENCE_NAMES
                    .get(n - 1)
                    .map(|name| name.to_string())
                    .unwrap_or_else(|| format!("User {}", n));
                // 生成した ID・表示名は常に空でない
                let id = UserId::new(format!("user{}", n)).ok()?;
                let name = DisplayName::new(name).ok()?;
                Some(Identity::new(id, name))
            })
            .collect();
        Self::new(entries)
    }

    /// 最も小さいインデックスの空き Identity を割り当てる
    pub fn assign(&mut self) -> Result<Identity, DomainError> {
        let index = self.free.pop_first().ok_or(DomainError::PoolExhausted)?;
        Ok(self.entries[index].clone())
    }

    /// Identity をプールに返却する
    ///
    /// プールに属さない、または貸し出されていない Identity の場合は何もせず `false` を返す。
    pub fn release(&mut self, identity: &Identity) -> bool {
        match self.entries.iter().position(|entry| entry == identity) {
            Some(index) => self.free.insert(index),
            None => false,
        }
    }

    /// プールの総数
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// 貸し出し中の件数
    pub fn assigned(&self) -> usize {
        self.entries.len() - self.free.len()
    }
}

impl Default for IdentityPool {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_pool_assigns_in_arrival_order() {
        // テスト項目: 既定のプールは到着順に user1, user2, user3 を割り当てる
        // given (前提条件):
        let mut pool = IdentityPool::reference();

        // when (操作):
        let first = pool.assign().unwrap();
        let second = pool.assign().unwrap();
        let third = pool.assign().unwrap();

        // then (期待する結果):
        assert_eq!(first.id.as_str(), "user1");
        assert_eq!(first.name.as_str(), "Alice");
        assert_eq!(second.id.as_str(), "user2");
        assert_eq!(second.name.as_str(), "Bob");
        assert_eq!(third.id.as_str(), "user3");
        assert_eq!(third.name.as_str(), "Charlie");
    }

    #[test]
    fn test_assign_fails_when_exhausted() {
        // テスト項目: プールが空になると PoolExhausted が返される
        // given (前提条件):
        let mut pool = IdentityPool::with_size(1);
        pool.assign().unwrap();

        // when (操作):
        let result = pool.assign();

        // then (期待する結果):
        assert_eq!(result, Err(DomainError::PoolExhausted));
        assert_eq!(pool.assigned(), 1);
    }

    #[test]
    fn test_released_identity_is_reused_before_later_entries() {
        // テスト項目: 途中で返却された Identity が、後続のエントリより先に再利用される
        // given (前提条件):
        let mut pool = IdentityPool::reference();
        let alice = pool.assign().unwrap();
        let _bob = pool.assign().unwrap();
        let _charlie = pool.assign().unwrap();

        // when (操作): Alice が切断し、新しい接続が来る
        assert!(pool.release(&alice));
        let next = pool.assign().unwrap();

        // then (期待する結果): 接続中の Charlie と重複せず、Alice が再割り当てされる
        assert_eq!(next, alice);
    }

    #[test]
    fn test_release_unknown_or_free_identity_is_noop() {
        // テスト項目: 貸し出されていない Identity の返却は何もしない
        // given (前提条件):
        let mut pool = IdentityPool::reference();
        let foreign = Identity::new(
            UserId::new("someone".to_string()).unwrap(),
            DisplayName::new("Someone".to_string()).unwrap(),
        );
        let alice = pool.assign().unwrap();
        pool.release(&alice);

        // when (操作):
        let foreign_released = pool.release(&foreign);
        let double_released = pool.release(&alice);

        // then (期待する結果):
        assert!(!foreign_released);
        assert!(!double_released);
        assert_eq!(pool.assigned(), 0);
    }

    #[test]
    fn test_with_size_extends_beyond_reference_names() {
        // テスト項目: 既定の 3 件を超えるプールは userN / User N で補われる
        // given (前提条件):
        let mut pool = IdentityPool::with_size(5);

        // when (操作):
        let identities: Vec<Identity> = (0..5).map(|_| pool.assign().unwrap()).collect();

        // then (期待する結果):
        assert_eq!(pool.capacity(), 5);
        assert_eq!(identities[3].id.as_str(), "user4");
        assert_eq!(identities[3].name.as_str(), "User 4");
        assert_eq!(identities[4].id.as_str(), "user5");
    }

    #[test]
    fn test_zero_sized_pool_refuses_everything() {
        // テスト項目: 容量 0 のプールは常に PoolExhausted を返す
        // given (前提条件):
        let mut pool = IdentityPool::with_size(0);

        // when (操作):
        let result = pool.assign();

        // then (期待する結果):
        assert_eq!(result, Err(DomainError::PoolExhausted));
    }
}
