// Strategy composer: owns the ordered block list of one definition in progress.
// Mutations are applied in the order they are received. Parameter values are
// stored raw; range checks happen once, in `validation`, so the composer may
// hold transiently invalid states while the user is still editing.

use crate::catalog::{BlockCatalog, KindId, ParamValue};
use crate::models::{BlockInstance, InstanceId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ComposerError {
    #[error("unknown block kind: {0}")]
    UnknownKind(String),
    #[error("block instance {0} not found")]
    InstanceNotFound(InstanceId),
}

/// Ordered, identity-addressed list of block instances
///
/// Not shareable across tasks without external locking; every operation
/// assumes exclusive access.
#[derive(Debug, Clone)]
pub struct StrategyComposer<'c> {
    catalog: &'c BlockCatalog,
    blocks: Vec<BlockInstance>,
    next_id: u64,
}

impl<'c> StrategyComposer<'c> {
    pub fn new(catalog: &'c BlockCatalog) -> Self {
        Self {
            catalog,
            blocks: Vec::new(),
            next_id: 1,
        }
    }

    /// Adopt an existing block list (e.g. from a loaded template).
    ///
    /// Instance ids are session-local, so they are reassigned `1..=n` in order.
    pub fn from_blocks(catalog: &'c BlockCatalog, blocks: Vec<BlockInstance>) -> Self {
        let mut composer = Self::new(catalog);
        for mut block in blocks {
            block.instance_id = composer.allocate_id();
            composer.blocks.push(block);
        }
        composer
    }

    pub fn catalog(&self) -> &'c BlockCatalog {
        self.catalog
    }

    fn allocate_id(&mut self) -> InstanceId {
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert a block of `kind_id` with catalog defaults.
    ///
    /// Appends when `at` is `None`; an index past the end clamps to the end.
    pub fn insert(&mut self, kind_id: &str, at: Option<usize>) -> Result<InstanceId, ComposerError> {
        let kind = self
            .catalog
            .lookup(kind_id)
            .ok_or_else(|| ComposerError::UnknownKind(kind_id.to_string()))?;
        let id = kind.id();
        self.insert_kind(id, at)
    }

    pub fn insert_kind(&mut self, kind: KindId, at: Option<usize>) -> Result<InstanceId, ComposerError> {
        let values = self
            .catalog
            .find(kind)
            .ok_or_else(|| ComposerError::UnknownKind(kind.to_string()))?
            .default_values();

        let instance_id = self.allocate_id();
        let index = at.unwrap_or(self.blocks.len()).min(self.blocks.len());
        self.blocks.insert(
            index,
            BlockInstance {
                instance_id,
                kind,
                values,
            },
        );

        tracing::debug!("Inserted {} as {} at index {}", kind, instance_id, index);

        Ok(instance_id)
    }

    /// Remove exactly one instance, preserving the relative order of the rest
    pub fn remove(&mut self, instance_id: InstanceId) -> Result<BlockInstance, ComposerError> {
        let index = self.index_of(instance_id)?;
        let removed = self.blocks.remove(index);

        tracing::debug!("Removed {} ({}) from index {}", instance_id, removed.kind, index);

        Ok(removed)
    }

    /// Reorder an instance. Out-of-range targets clamp to the last position.
    ///
    /// Returns the index the instance ended up at.
    pub fn move_block(&mut self, instance_id: InstanceId, to_index: usize) -> Result<usize, ComposerError> {
        let from = self.index_of(instance_id)?;
        let block = self.blocks.remove(from);
        let to = to_index.min(self.blocks.len());
        self.blocks.insert(to, block);

        tracing::debug!("Moved {} from index {} to {}", instance_id, from, to);

        Ok(to)
    }

    /// Store a raw parameter value; no range or key checking happens here
    pub fn set_parameter(
        &mut self,
        instance_id: InstanceId,
        param: &str,
        value: impl Into<ParamValue>,
    ) -> Result<(), ComposerError> {
        let index = self.index_of(instance_id)?;
        let value = value.into();

        tracing::debug!("Set {}.{} = {}", instance_id, param, value);

        self.blocks[index].values.insert(param.to_string(), value);
        Ok(())
    }

    /// Read-only copy of the composed order, for validation and emission
    pub fn snapshot(&self) -> Vec<BlockInstance> {
        self.blocks.clone()
    }

    pub fn blocks(&self) -> &[BlockInstance] {
        &self.blocks
    }

    pub fn get(&self, instance_id: InstanceId) -> Option<&BlockInstance> {
        self.blocks.iter().find(|b| b.instance_id == instance_id)
    }

    pub fn position(&self, instance_id: InstanceId) -> Option<usize> {
        self.blocks.iter().position(|b| b.instance_id == instance_id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    fn index_of(&self, instance_id: InstanceId) -> Result<usize, ComposerError> {
        self.position(instance_id)
            .ok_or(ComposerError::InstanceNotFound(instance_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ActionKind, IndicatorKind};

    fn kinds(composer: &StrategyComposer) -> Vec<&'static str> {
        composer.blocks().iter().map(|b| b.kind.as_str()).collect()
    }

    fn ids(composer: &StrategyComposer) -> Vec<InstanceId> {
        composer.blocks().iter().map(|b| b.instance_id).collect()
    }

    #[test]
    fn test_insert_appends_with_defaults() {
        let mut composer = StrategyComposer::new(BlockCatalog::builtin());
        let rsi = composer.insert("rsi", None).unwrap();
        let buy = composer.insert("buy", None).unwrap();

        assert_ne!(rsi, buy);
        assert_eq!(kinds(&composer), vec!["rsi", "buy"]);
        assert_eq!(
            composer.get(rsi).unwrap().value("period"),
            Some(&ParamValue::Number(14.0))
        );
    }

    #[test]
    fn test_insert_at_index_and_clamp() {
        let mut composer = StrategyComposer::new(BlockCatalog::builtin());
        composer.insert("rsi", None).unwrap();
        composer.insert("buy", None).unwrap();
        composer.insert("rsi_oversold", Some(1)).unwrap();
        composer.insert("sell", Some(99)).unwrap();
        composer.insert("macd", Some(0)).unwrap();

        assert_eq!(
            kinds(&composer),
            vec!["macd", "rsi", "rsi_oversold", "buy", "sell"]
        );
    }

    #[test]
    fn test_same_kind_twice_gets_distinct_ids() {
        let mut composer = StrategyComposer::new(BlockCatalog::builtin());
        let a = composer.insert("rsi", None).unwrap();
        let b = composer.insert("rsi", None).unwrap();
        composer.set_parameter(b, "period", 21.0).unwrap();

        assert_ne!(a, b);
        assert_eq!(composer.get(a).unwrap().value("period"), Some(&14.0.into()));
        assert_eq!(composer.get(b).unwrap().value("period"), Some(&21.0.into()));
    }

    #[test]
    fn test_unknown_kind() {
        let mut composer = StrategyComposer::new(BlockCatalog::builtin());
        assert_eq!(
            composer.insert("ichimoku", None),
            Err(ComposerError::UnknownKind("ichimoku".to_string()))
        );
        assert!(composer.is_empty());
    }

    #[test]
    fn test_kind_missing_from_restricted_catalog() {
        let catalog = BlockCatalog::from_kinds(vec![BlockCatalog::builtin()
            .get(KindId::Action(ActionKind::Buy))
            .clone()]);
        let mut composer = StrategyComposer::new(&catalog);
        assert!(composer.insert("buy", None).is_ok());
        assert_eq!(
            composer.insert_kind(KindId::Indicator(IndicatorKind::Rsi), None),
            Err(ComposerError::UnknownKind("rsi".to_string()))
        );
    }

    #[test]
    fn test_remove_preserves_relative_order() {
        let mut composer = StrategyComposer::new(BlockCatalog::builtin());
        let a = composer.insert("rsi", None).unwrap();
        let b = composer.insert("macd", None).unwrap();
        let c = composer.insert("buy", None).unwrap();

        let removed = composer.remove(b).unwrap();
        assert_eq!(removed.kind.as_str(), "macd");
        assert_eq!(ids(&composer), vec![a, c]);

        assert_eq!(composer.remove(b), Err(ComposerError::InstanceNotFound(b)));
        assert_eq!(composer.len(), 2);
    }

    #[test]
    fn test_move_and_move_back_restores_order() {
        let mut composer = StrategyComposer::new(BlockCatalog::builtin());
        composer.insert("rsi", None).unwrap();
        composer.insert("less_than", None).unwrap();
        let buy = composer.insert("buy", None).unwrap();
        let original = ids(&composer);

        assert_eq!(composer.move_block(buy, 0).unwrap(), 0);
        assert_eq!(kinds(&composer), vec!["buy", "rsi", "less_than"]);

        composer.move_block(buy, 2).unwrap();
        assert_eq!(ids(&composer), original);
    }

    #[test]
    fn test_move_clamps_out_of_range() {
        let mut composer = StrategyComposer::new(BlockCatalog::builtin());
        let a = composer.insert("rsi", None).unwrap();
        composer.insert("buy", None).unwrap();

        assert_eq!(composer.move_block(a, 42).unwrap(), 1);
        assert_eq!(kinds(&composer), vec!["buy", "rsi"]);
        assert!(composer.move_block(InstanceId(999), 0).is_err());
    }

    #[test]
    fn test_set_parameter_keeps_raw_invalid_values() {
        let mut composer = StrategyComposer::new(BlockCatalog::builtin());
        let rsi = composer.insert("rsi", None).unwrap();
        composer.set_parameter(rsi, "period", 500.0).unwrap();
        composer.set_parameter(rsi, "smoothing", true).unwrap();

        let block = composer.get(rsi).unwrap();
        assert_eq!(block.value("period"), Some(&ParamValue::Number(500.0)));
        assert_eq!(block.value("smoothing"), Some(&ParamValue::Bool(true)));

        assert_eq!(
            composer.set_parameter(InstanceId(77), "period", 1.0),
            Err(ComposerError::InstanceNotFound(InstanceId(77)))
        );
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut composer = StrategyComposer::new(BlockCatalog::builtin());
        let rsi = composer.insert("rsi", None).unwrap();
        let snapshot = composer.snapshot();
        composer.set_parameter(rsi, "period", 30.0).unwrap();
        composer.insert("buy", None).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].value("period"), Some(&14.0.into()));
    }

    #[test]
    fn test_from_blocks_renumbers() {
        let mut source = StrategyComposer::new(BlockCatalog::builtin());
        source.insert("rsi", None).unwrap();
        source.insert("buy", None).unwrap();
        let mut blocks = source.snapshot();
        blocks[0].instance_id = InstanceId(0);
        blocks[1].instance_id = InstanceId(0);

        let mut composer = StrategyComposer::from_blocks(BlockCatalog::builtin(), blocks);
        assert_eq!(ids(&composer), vec![InstanceId(1), InstanceId(2)]);
        let next = composer.insert("sell", None).unwrap();
        assert_eq!(next, InstanceId(3));
    }
}
