//! IrContext: arena-based mutable IR storage.
//!
//! All IR entities (operations, values, blocks, regions) are stored in
//! `PrimaryMap`s owned by `IrContext`. Operand and result-value lists use
//! `EntityList + ListPool` for compact 4-byte per-field storage.
//!
//! Construction (`create_op`, `push_op`, ...) is public. Mutation of an
//! already-built graph is crate-private and goes through
//! [`PatternRewriter`](crate::rewrite::PatternRewriter), which keeps the
//! rewrite driver informed of every change.

use std::collections::BTreeMap;

use cranelift_entity::{EntityList, ListPool, PrimaryMap, SecondaryMap};
use smallvec::SmallVec;

use crate::kind::OpKind;
use crate::refs::*;
use crate::types::*;

// ============================================================================
// Use-chain
// ============================================================================

/// A single use of a value: which operation uses it, at which operand index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Use {
    pub user: OpRef,
    pub operand_index: u32,
}

// ============================================================================
// Entity data types
// ============================================================================

/// Data for a single operation in the arena.
#[derive(Clone)]
pub struct OperationData {
    pub location: Location,
    pub kind: OpKind,
    pub operands: EntityList<ValueRef>,
    pub results: SmallVec<[Type; 2]>,
    pub attributes: BTreeMap<&'static str, Attribute>,
    pub regions: SmallVec<[RegionRef; 2]>,
    pub parent_block: Option<BlockRef>,
    erased: bool,
}

/// Data for a single SSA value.
#[derive(Clone)]
pub struct ValueData {
    pub def: ValueDef,
    pub ty: Type,
}

/// Data for a basic block.
#[derive(Clone)]
pub struct BlockData {
    pub location: Location,
    pub args: Vec<Type>,
    pub ops: SmallVec<[OpRef; 4]>,
    pub parent_region: Option<RegionRef>,
}

/// Data for a region (list of blocks).
#[derive(Clone)]
pub struct RegionData {
    pub location: Location,
    pub blocks: SmallVec<[BlockRef; 4]>,
    pub parent_op: Option<OpRef>,
}

// ============================================================================
// IrContext
// ============================================================================

/// Arena-based mutable IR context.
///
/// Owns all IR entities and provides methods for creating, querying,
/// and mutating them. Use-chains are automatically maintained.
#[derive(Clone)]
pub struct IrContext {
    ops: PrimaryMap<OpRef, OperationData>,
    values: PrimaryMap<ValueRef, ValueData>,
    blocks: PrimaryMap<BlockRef, BlockData>,
    regions: PrimaryMap<RegionRef, RegionData>,

    /// Use-chain: for each value, the list of operations that use it.
    uses: SecondaryMap<ValueRef, SmallVec<[Use; 2]>>,

    pub paths: PathInterner,

    /// Backing pool for EntityList storage.
    value_pool: ListPool<ValueRef>,

    /// Mapping from operation to its result ValueRefs.
    result_values: SecondaryMap<OpRef, EntityList<ValueRef>>,
    /// Mapping from block to its argument ValueRefs.
    block_arg_values: SecondaryMap<BlockRef, EntityList<ValueRef>>,
}

impl IrContext {
    /// Create a new empty IR context.
    pub fn new() -> Self {
        Self {
            ops: PrimaryMap::new(),
            values: PrimaryMap::new(),
            blocks: PrimaryMap::new(),
            regions: PrimaryMap::new(),
            uses: SecondaryMap::new(),
            paths: PathInterner::new(),
            value_pool: ListPool::new(),
            result_values: SecondaryMap::new(),
            block_arg_values: SecondaryMap::new(),
        }
    }

    // ========================================================================
    // Operation
    // ========================================================================

    /// Create a new operation and allocate result values for it.
    ///
    /// The operation's operands are registered in the use-chain.
    /// The operation must not have a `parent_block` set; use `push_op` to
    /// attach it to a block after creation.
    ///
    /// # Panics
    ///
    /// Panics if `data.parent_block` is `Some`, or if any region in
    /// `data.regions` already belongs to another operation.
    pub fn create_op(&mut self, data: OperationData) -> OpRef {
        assert!(
            data.parent_block.is_none(),
            "create_op: operation must not have parent_block set; \
             use push_op to attach to a block after creation",
        );

        let operand_slice: SmallVec<[ValueRef; 8]> =
            data.operands.as_slice(&self.value_pool).into();
        let result_types = data.results.clone();
        let regions = data.regions.clone();

        let op = self.ops.push(data);

        // Back-link owned regions to this operation
        for &r in &regions {
            if let Some(existing) = self.regions[r].parent_op {
                panic!(
                    "create_op: region {r} already belongs to operation {existing}; \
                     cannot reassign to {op}",
                );
            }
            self.regions[r].parent_op = Some(op);
        }

        for (idx, &val) in operand_slice.iter().enumerate() {
            self.uses[val].push(Use {
                user: op,
                operand_index: idx as u32,
            });
        }

        let mut result_value_list = EntityList::new();
        for (idx, &ty) in result_types.iter().enumerate() {
            let v = self.values.push(ValueData {
                def: ValueDef::OpResult(op, idx as u32),
                ty,
            });
            result_value_list.push(v, &mut self.value_pool);
        }
        self.result_values[op] = result_value_list;

        op
    }

    /// Get immutable reference to operation data.
    ///
    /// # Panics
    ///
    /// Panics if the operation has been erased.
    pub fn op(&self, op: OpRef) -> &OperationData {
        let data = &self.ops[op];
        assert!(!data.erased, "operation {op} has been erased");
        data
    }

    /// Whether the operation still exists (has not been erased).
    pub fn is_live(&self, op: OpRef) -> bool {
        !self.ops[op].erased
    }

    pub fn op_kind(&self, op: OpRef) -> OpKind {
        self.op(op).kind
    }

    /// Get the operands of an operation as a slice.
    pub fn op_operands(&self, op: OpRef) -> &[ValueRef] {
        self.op(op).operands.as_slice(&self.value_pool)
    }

    /// Get the i-th operand of an operation.
    pub fn op_operand(&self, op: OpRef, index: usize) -> ValueRef {
        self.op_operands(op)[index]
    }

    /// Get the result types of an operation as a slice.
    pub fn op_result_types(&self, op: OpRef) -> &[Type] {
        &self.op(op).results
    }

    /// Get the i-th result value of an operation.
    pub fn op_result(&self, op: OpRef, index: u32) -> ValueRef {
        self.op_results(op)[index as usize]
    }

    /// Get all result values of an operation.
    pub fn op_results(&self, op: OpRef) -> &[ValueRef] {
        debug_assert!(self.is_live(op), "operation {op} has been erased");
        self.result_values[op].as_slice(&self.value_pool)
    }

    pub fn attr(&self, op: OpRef, key: &str) -> Option<&Attribute> {
        self.op(op).attributes.get(key)
    }

    // ========================================================================
    // Value
    // ========================================================================

    /// Get immutable reference to value data.
    pub fn value(&self, v: ValueRef) -> &ValueData {
        &self.values[v]
    }

    /// Get the type of a value.
    pub fn value_ty(&self, v: ValueRef) -> Type {
        self.values[v].ty
    }

    /// Get the definition of a value.
    pub fn value_def(&self, v: ValueRef) -> ValueDef {
        self.values[v].def
    }

    /// Get the operation defining a value, or `None` for a block argument.
    pub fn defining_op(&self, v: ValueRef) -> Option<OpRef> {
        self.values[v].def.op()
    }

    // ========================================================================
    // Block
    // ========================================================================

    /// Create a new block and allocate argument values for it.
    pub fn create_block(&mut self, data: BlockData) -> BlockRef {
        let arg_types = data.args.clone();
        let block = self.blocks.push(data);

        let mut arg_value_list = EntityList::new();
        for (idx, ty) in arg_types.into_iter().enumerate() {
            let v = self.values.push(ValueData {
                def: ValueDef::BlockArg(block, idx as u32),
                ty,
            });
            arg_value_list.push(v, &mut self.value_pool);
        }
        self.block_arg_values[block] = arg_value_list;

        block
    }

    /// Get immutable reference to block data.
    pub fn block(&self, b: BlockRef) -> &BlockData {
        &self.blocks[b]
    }

    /// Get the i-th block argument value.
    pub fn block_arg(&self, b: BlockRef, index: u32) -> ValueRef {
        self.block_arg_values[b].as_slice(&self.value_pool)[index as usize]
    }

    /// Get all block argument values.
    pub fn block_args(&self, b: BlockRef) -> &[ValueRef] {
        self.block_arg_values[b].as_slice(&self.value_pool)
    }

    /// Append an operation to the end of a block.
    ///
    /// # Panics
    ///
    /// Panics if the operation already belongs to a block.
    pub fn push_op(&mut self, block: BlockRef, op: OpRef) {
        if let Some(existing) = self.op(op).parent_block {
            panic!(
                "push_op: operation {op} already belongs to {existing}; \
                 remove it from the old block first",
            );
        }
        self.ops[op].parent_block = Some(block);
        self.blocks[block].ops.push(op);
    }

    // ========================================================================
    // Region
    // ========================================================================

    /// Create a new region.
    ///
    /// # Panics
    ///
    /// Panics if any block in `data.blocks` already belongs to another region.
    pub fn create_region(&mut self, data: RegionData) -> RegionRef {
        let region = self.regions.push(data);

        let blocks: SmallVec<[BlockRef; 4]> = self.regions[region].blocks.clone();
        for &b in &blocks {
            if let Some(existing) = self.blocks[b].parent_region {
                panic!(
                    "create_region: block {b} already belongs to region {existing}; \
                     cannot reassign to {region}",
                );
            }
            self.blocks[b].parent_region = Some(region);
        }

        region
    }

    /// Get immutable reference to region data.
    pub fn region(&self, r: RegionRef) -> &RegionData {
        &self.regions[r]
    }

    /// The region enclosing an operation, if it is attached to a block.
    pub fn parent_region(&self, op: OpRef) -> Option<RegionRef> {
        let block = self.op(op).parent_block?;
        self.blocks[block].parent_region
    }

    /// The operation owning the region that encloses `op`.
    pub fn parent_op(&self, op: OpRef) -> Option<OpRef> {
        let region = self.parent_region(op)?;
        self.regions[region].parent_op
    }

    /// Position of an operation within its parent block.
    pub fn op_position(&self, op: OpRef) -> Option<usize> {
        let block = self.op(op).parent_block?;
        self.blocks[block].ops.iter().position(|&o| o == op)
    }

    /// Whether `v` may be referenced by an operation placed at `anchor`.
    ///
    /// True for results of operations preceding `anchor` (or preceding one of
    /// its ancestors) in the same block, and for arguments of blocks enclosing
    /// `anchor`. Anything else would be a forward reference.
    pub fn is_available_at(&self, v: ValueRef, anchor: OpRef) -> bool {
        let mut cursor = anchor;
        loop {
            let Some(block) = self.op(cursor).parent_block else {
                return false;
            };
            match self.value_def(v) {
                ValueDef::BlockArg(def_block, _) if def_block == block => return true,
                ValueDef::OpResult(def_op, _)
                    if self.is_live(def_op) && self.op(def_op).parent_block == Some(block) =>
                {
                    return self.op_position(def_op) < self.op_position(cursor);
                }
                _ => {}
            }
            match self.parent_op(cursor) {
                Some(parent) => cursor = parent,
                None => return false,
            }
        }
    }

    // ========================================================================
    // Use-chain
    // ========================================================================

    /// Get all uses of a value.
    pub fn uses(&self, v: ValueRef) -> &[Use] {
        &self.uses[v]
    }

    /// Append a use-chain entry without touching any operand.
    #[cfg(test)]
    pub(crate) fn push_use_unchecked(&mut self, v: ValueRef, entry: Use) {
        self.uses[v].push(entry);
    }

    /// Check if a value has any uses.
    pub fn has_uses(&self, v: ValueRef) -> bool {
        !self.uses[v].is_empty()
    }

    pub fn use_count(&self, v: ValueRef) -> usize {
        self.uses[v].len()
    }

    /// Total number of uses across all results of an operation.
    pub fn result_use_count(&self, op: OpRef) -> usize {
        self.op_results(op).iter().map(|&v| self.use_count(v)).sum()
    }

    /// Operations reading any result of `op`, deduplicated, in use order.
    pub fn users(&self, op: OpRef) -> SmallVec<[OpRef; 4]> {
        let mut users: SmallVec<[OpRef; 4]> = SmallVec::new();
        for &v in self.op_results(op) {
            for u in self.uses(v) {
                if !users.contains(&u.user) {
                    users.push(u.user);
                }
            }
        }
        users
    }

    // ========================================================================
    // Mutation (rewriter only)
    // ========================================================================

    /// Replace a single operand, moving the use-chain entry along with it.
    pub(crate) fn set_operand(&mut self, op: OpRef, index: usize, new: ValueRef) {
        let old = {
            let slice = self.ops[op].operands.as_mut_slice(&mut self.value_pool);
            assert!(
                index < slice.len(),
                "set_operand: operand index {index} out of range for {op} ({} operands)",
                slice.len(),
            );
            std::mem::replace(&mut slice[index], new)
        };
        if old == new {
            return;
        }
        let u = Use {
            user: op,
            operand_index: index as u32,
        };
        self.uses[old].retain(|existing| *existing != u);
        self.uses[new].push(u);
    }

    /// Insert a detached operation before `before` in `before`'s block.
    ///
    /// # Panics
    ///
    /// Panics if the operation already belongs to a block, or if `before`
    /// is not attached to one.
    pub(crate) fn insert_op_before(&mut self, before: OpRef, op: OpRef) {
        if let Some(existing) = self.op(op).parent_block {
            panic!(
                "insert_op_before: operation {op} already belongs to {existing}; \
                 remove it from the old block first",
            );
        }
        let block = self
            .op(before)
            .parent_block
            .unwrap_or_else(|| panic!("insert_op_before: anchor {before} is detached"));
        let ops = &mut self.blocks[block].ops;
        let pos = ops
            .iter()
            .position(|&o| o == before)
            .unwrap_or_else(|| panic!("insert_op_before: {before} not found in {block}"));
        ops.insert(pos, op);
        self.ops[op].parent_block = Some(block);
    }

    /// Replace all uses of `old` with `new` in all operations.
    ///
    /// Updates both operand lists and the use-chain.
    pub(crate) fn replace_all_uses(&mut self, old: ValueRef, new: ValueRef) {
        if old == new {
            return;
        }
        let old_uses = std::mem::take(&mut self.uses[old]);

        for u in &old_uses {
            let operands = &mut self.ops[u.user].operands;
            let slice = operands.as_mut_slice(&mut self.value_pool);
            debug_assert_eq!(slice[u.operand_index as usize], old);
            slice[u.operand_index as usize] = new;

            self.uses[new].push(*u);
        }
    }

    /// Erase an operation together with everything nested in its regions.
    ///
    /// The arena slot is tombstoned: the `OpRef` stays valid for `is_live`
    /// queries but every other lookup panics.
    ///
    /// # Panics
    ///
    /// Panics if any result value of the operation still has uses,
    /// as that would leave dangling references.
    pub(crate) fn erase_op(&mut self, op: OpRef) {
        for &val in self.op_results(op) {
            assert!(
                self.uses[val].is_empty(),
                "erase_op: result value {val} of {op} still has {} use(s); \
                 replace all uses before erasing the operation",
                self.uses[val].len()
            );
        }

        if let Some(block) = self.ops[op].parent_block.take() {
            self.blocks[block].ops.retain(|o| *o != op);
        }
        self.erase_detached(op);
    }

    fn erase_detached(&mut self, op: OpRef) {
        let regions = self.ops[op].regions.clone();
        for region in regions {
            let blocks = self.regions[region].blocks.clone();
            for block in blocks {
                let nested = std::mem::take(&mut self.blocks[block].ops);
                for &inner in nested.iter().rev() {
                    self.ops[inner].parent_block = None;
                    self.erase_detached(inner);
                }
            }
        }

        let operands: SmallVec<[ValueRef; 8]> =
            self.ops[op].operands.as_slice(&self.value_pool).into();
        for (idx, &val) in operands.iter().enumerate() {
            self.uses[val].retain(|u| !(u.user == op && u.operand_index == idx as u32));
        }
        self.ops[op].erased = true;
    }
}

impl Default for IrContext {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builder for OperationData
// ============================================================================

/// Builder for constructing `OperationData` with pool-backed lists.
///
/// Collects operands into a `Vec`, then packs them into an `EntityList` on
/// `build()`.
pub struct OperationDataBuilder {
    location: Location,
    kind: OpKind,
    operands: Vec<ValueRef>,
    results: SmallVec<[Type; 2]>,
    attributes: BTreeMap<&'static str, Attribute>,
    regions: SmallVec<[RegionRef; 2]>,
}

impl OperationDataBuilder {
    pub fn new(location: Location, kind: OpKind) -> Self {
        Self {
            location,
            kind,
            operands: Vec::new(),
            results: SmallVec::new(),
            attributes: BTreeMap::new(),
            regions: SmallVec::new(),
        }
    }

    pub fn operand(mut self, v: ValueRef) -> Self {
        self.operands.push(v);
        self
    }

    pub fn operands(mut self, vs: impl IntoIterator<Item = ValueRef>) -> Self {
        self.operands.extend(vs);
        self
    }

    pub fn result(mut self, ty: Type) -> Self {
        self.results.push(ty);
        self
    }

    pub fn results(mut self, tys: impl IntoIterator<Item = Type>) -> Self {
        self.results.extend(tys);
        self
    }

    pub fn attr(mut self, key: &'static str, val: impl Into<Attribute>) -> Self {
        self.attributes.insert(key, val.into());
        self
    }

    pub fn region(mut self, r: RegionRef) -> Self {
        self.regions.push(r);
        self
    }

    /// Build the `OperationData`, packing operands into an `EntityList`
    /// using the context's pool.
    pub fn build(self, ctx: &mut IrContext) -> OperationData {
        let mut operands = EntityList::new();
        for v in self.operands {
            operands.push(v, &mut ctx.value_pool);
        }
        OperationData {
            location: self.location,
            kind: self.kind,
            operands,
            results: self.results,
            attributes: self.attributes,
            regions: self.regions,
            parent_block: None,
            erased: false,
        }
    }
}
