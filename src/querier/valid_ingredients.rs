// ABOUTME: Valid ingredient persistence: descriptor, row scanning, name lookups, and data-manager contract
// ABOUTME: Ingredients carry allergen and dietary flags; shared by every account, so lists take no scope
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use larder_core::errors::DatabaseResult;
use larder_core::models::{
    AuditLogEntry, AuditResource, FieldChangeSummary, ValidIngredient,
    ValidIngredientCreationInput,
};
use larder_core::pagination::{ListPage, QueryFilter};
use tokio::sync::mpsc::Sender;

use super::{id_set, BatchStreamReport, Entity, NameSearchable, Scannable, Scanned, SqlQuerier};
use crate::context::QueryContext;
use crate::database::Row;
use crate::querybuilding::{EntitySqlQueryBuilder, NameSearchSqlQueryBuilder, SqlQueryBuilder};

id_set! {
    /// Identifies one valid ingredient
    ValidIngredientKey { valid_ingredient_id }
}

impl Scannable for ValidIngredient {
    fn scan(row: &Row, include_counts: bool) -> DatabaseResult<Scanned<Self>> {
        let mut reader = row.reader();
        let record = Self {
            id: reader.read_u64()?,
            external_id: reader.read_string()?,
            name: reader.read_string()?,
            variant: reader.read_string()?,
            description: reader.read_string()?,
            warning: reader.read_string()?,
            contains_egg: reader.read_bool()?,
            contains_dairy: reader.read_bool()?,
            contains_peanut: reader.read_bool()?,
            contains_tree_nut: reader.read_bool()?,
            contains_soy: reader.read_bool()?,
            contains_wheat: reader.read_bool()?,
            contains_shellfish: reader.read_bool()?,
            contains_sesame: reader.read_bool()?,
            contains_fish: reader.read_bool()?,
            contains_gluten: reader.read_bool()?,
            animal_flesh: reader.read_bool()?,
            animal_derived: reader.read_bool()?,
            volumetric: reader.read_bool()?,
            icon_path: reader.read_string()?,
            created_on: reader.read_u64()?,
            last_updated_on: reader.read_optional_u64()?,
            archived_on: reader.read_optional_u64()?,
        };
        Scanned::finish(record, &mut reader, include_counts)
    }
}

impl Entity for ValidIngredient {
    const NAME: &'static str = "valid ingredient";
    const RESOURCE: AuditResource = AuditResource::ValidIngredient;

    type Key = ValidIngredientKey;
    type Scope = ();
    type Owner = ();
    type ArchiveKey = ValidIngredientKey;
    type CreationInput = ValidIngredientCreationInput;

    fn id(&self) -> u64 {
        self.id
    }

    fn from_creation_input(input: &Self::CreationInput, id: u64, created_on: u64) -> Self {
        Self {
            id,
            external_id: String::new(),
            name: input.name.clone(),
            variant: input.variant.clone(),
            description: input.description.clone(),
            warning: input.warning.clone(),
            contains_egg: input.contains_egg,
            contains_dairy: input.contains_dairy,
            contains_peanut: input.contains_peanut,
            contains_tree_nut: input.contains_tree_nut,
            contains_soy: input.contains_soy,
            contains_wheat: input.contains_wheat,
            contains_shellfish: input.contains_shellfish,
            contains_sesame: input.contains_sesame,
            contains_fish: input.contains_fish,
            contains_gluten: input.contains_gluten,
            animal_flesh: input.animal_flesh,
            animal_derived: input.animal_derived,
            volumetric: input.volumetric,
            icon_path: input.icon_path.clone(),
            created_on,
            last_updated_on: None,
            archived_on: None,
        }
    }

    fn query_builder(builder: &dyn SqlQueryBuilder) -> &dyn EntitySqlQueryBuilder<Self> {
        builder.valid_ingredients()
    }
}

impl NameSearchable for ValidIngredient {
    fn name_query_builder(builder: &dyn SqlQueryBuilder) -> &dyn NameSearchSqlQueryBuilder<Self> {
        builder.valid_ingredient_names()
    }
}

/// Persistence contract for valid ingredients
#[async_trait]
pub trait ValidIngredientDataManager: Send + Sync {
    /// Whether the valid ingredient exists
    async fn valid_ingredient_exists(
        &self,
        ctx: &QueryContext,
        valid_ingredient_id: u64,
    ) -> DatabaseResult<bool>;

    /// Fetch one valid ingredient
    async fn get_valid_ingredient(
        &self,
        ctx: &QueryContext,
        valid_ingredient_id: u64,
    ) -> DatabaseResult<ValidIngredient>;

    /// Valid ingredients whose name matches `name`
    async fn search_for_valid_ingredients(
        &self,
        ctx: &QueryContext,
        name: &str,
    ) -> DatabaseResult<Vec<ValidIngredient>>;

    /// Id of the valid ingredient named exactly `name`
    async fn get_valid_ingredient_id_for_name(
        &self,
        ctx: &QueryContext,
        name: &str,
    ) -> DatabaseResult<u64>;

    /// Count non-archived valid ingredients
    async fn get_all_valid_ingredients_count(&self, ctx: &QueryContext) -> DatabaseResult<u64>;

    /// Stream every valid ingredient to `sink` in parallel batches
    async fn get_all_valid_ingredients(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ValidIngredient>>>,
        batch_size: u16,
    ) -> DatabaseResult<()>;

    /// Stream every valid ingredient to `sink` and wait for every batch
    ///
    /// The sink is drained concurrently or holds every batch; otherwise a
    /// full sink blocks the batch tasks and this call never returns.
    async fn get_all_valid_ingredients_joined(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ValidIngredient>>>,
        batch_size: u16,
    ) -> DatabaseResult<BatchStreamReport>;

    /// Fetch one filtered page of valid ingredients
    async fn get_valid_ingredients(
        &self,
        ctx: &QueryContext,
        filter: Option<&QueryFilter>,
    ) -> DatabaseResult<ListPage<ValidIngredient>>;

    /// Fetch valid ingredients by id
    async fn get_valid_ingredients_with_ids(
        &self,
        ctx: &QueryContext,
        limit: u8,
        ids: &[u64],
    ) -> DatabaseResult<Vec<ValidIngredient>>;

    /// Create a valid ingredient with its creation audit entry
    async fn create_valid_ingredient(
        &self,
        ctx: &QueryContext,
        input: Option<&ValidIngredientCreationInput>,
        created_by: u64,
    ) -> DatabaseResult<ValidIngredient>;

    /// Update a valid ingredient with its update audit entry
    async fn update_valid_ingredient(
        &self,
        ctx: &QueryContext,
        updated: Option<&ValidIngredient>,
        changed_by: u64,
        changes: &[FieldChangeSummary],
    ) -> DatabaseResult<()>;

    /// Archive a valid ingredient with its archive audit entry
    async fn archive_valid_ingredient(
        &self,
        ctx: &QueryContext,
        valid_ingredient_id: u64,
        archived_by: u64,
    ) -> DatabaseResult<()>;

    /// Audit entries recorded for a valid ingredient
    async fn get_audit_log_entries_for_valid_ingredient(
        &self,
        ctx: &QueryContext,
        valid_ingredient_id: u64,
    ) -> DatabaseResult<Vec<AuditLogEntry>>;
}

#[async_trait]
impl ValidIngredientDataManager for SqlQuerier {
    async fn valid_ingredient_exists(
        &self,
        ctx: &QueryContext,
        valid_ingredient_id: u64,
    ) -> DatabaseResult<bool> {
        self.entity_exists::<ValidIngredient>(ctx, &ValidIngredientKey { valid_ingredient_id })
            .await
    }

    async fn get_valid_ingredient(
        &self,
        ctx: &QueryContext,
        valid_ingredient_id: u64,
    ) -> DatabaseResult<ValidIngredient> {
        self.get_entity(ctx, &ValidIngredientKey { valid_ingredient_id })
            .await
    }

    async fn search_for_valid_ingredients(
        &self,
        ctx: &QueryContext,
        name: &str,
    ) -> DatabaseResult<Vec<ValidIngredient>> {
        self.search_entities_by_name(ctx, name).await
    }

    async fn get_valid_ingredient_id_for_name(
        &self,
        ctx: &QueryContext,
        name: &str,
    ) -> DatabaseResult<u64> {
        self.get_entity_id_for_name::<ValidIngredient>(ctx, name)
            .await
    }

    async fn get_all_valid_ingredients_count(&self, ctx: &QueryContext) -> DatabaseResult<u64> {
        self.get_all_entities_count::<ValidIngredient>(ctx).await
    }

    async fn get_all_valid_ingredients(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ValidIngredient>>>,
        batch_size: u16,
    ) -> DatabaseResult<()> {
        self.get_all_entities(ctx, sink, batch_size).await
    }

    async fn get_all_valid_ingredients_joined(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ValidIngredient>>>,
        batch_size: u16,
    ) -> DatabaseResult<BatchStreamReport> {
        self.get_all_entities_joined(ctx, sink, batch_size).await
    }

    async fn get_valid_ingredients(
        &self,
        ctx: &QueryContext,
        filter: Option<&QueryFilter>,
    ) -> DatabaseResult<ListPage<ValidIngredient>> {
        self.get_entities(ctx, &(), filter).await
    }

    async fn get_valid_ingredients_with_ids(
        &self,
        ctx: &QueryContext,
        limit: u8,
        ids: &[u64],
    ) -> DatabaseResult<Vec<ValidIngredient>> {
        self.get_entities_with_ids(ctx, &(), limit, ids).await
    }

    async fn create_valid_ingredient(
        &self,
        ctx: &QueryContext,
        input: Option<&ValidIngredientCreationInput>,
        created_by: u64,
    ) -> DatabaseResult<ValidIngredient> {
        self.create_entity::<ValidIngredient>(ctx, input, created_by)
            .await
    }

    async fn update_valid_ingredient(
        &self,
        ctx: &QueryContext,
        updated: Option<&ValidIngredient>,
        changed_by: u64,
        changes: &[FieldChangeSummary],
    ) -> DatabaseResult<()> {
        self.update_entity(ctx, updated, changed_by, changes).await
    }

    async fn archive_valid_ingredient(
        &self,
        ctx: &QueryContext,
        valid_ingredient_id: u64,
        archived_by: u64,
    ) -> DatabaseResult<()> {
        let key = ValidIngredientKey {
            valid_ingredient_id,
        };
        self.archive_entity::<ValidIngredient>(ctx, &key, archived_by)
            .await
    }

    async fn get_audit_log_entries_for_valid_ingredient(
        &self,
        ctx: &QueryContext,
        valid_ingredient_id: u64,
    ) -> DatabaseResult<Vec<AuditLogEntry>> {
        self.get_audit_log_entries_for_entity::<ValidIngredient>(ctx, valid_ingredient_id)
            .await
    }
}
