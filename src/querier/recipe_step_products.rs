// ABOUTME: Recipe step product persistence: descriptor, row scanning, and the data-manager contract
// ABOUTME: Products are addressed through their recipe and step; every id is validated left to right
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use larder_core::errors::DatabaseResult;
use larder_core::models::{
    AuditLogEntry, AuditResource, FieldChangeSummary, RecipeStepProduct,
    RecipeStepProductCreationInput,
};
use larder_core::pagination::{ListPage, QueryFilter};
use tokio::sync::mpsc::Sender;

use super::{id_set, BatchStreamReport, Entity, Scannable, Scanned, SqlQuerier};
use crate::context::QueryContext;
use crate::database::Row;
use crate::querybuilding::{EntitySqlQueryBuilder, SqlQueryBuilder};

id_set! {
    /// Identifies one product of one step of one recipe
    RecipeStepProductKey { recipe_id, recipe_step_id, recipe_step_product_id }
}

id_set! {
    /// Scopes list queries to one step of one recipe
    RecipeStepProductScope { recipe_id, recipe_step_id }
}

id_set! {
    /// Scopes bulk fetches to one recipe step
    RecipeStepProductOwner { recipe_step_id }
}

id_set! {
    /// Identifies the product to archive within its step
    RecipeStepProductArchiveKey { recipe_step_id, recipe_step_product_id }
}

impl Scannable for RecipeStepProduct {
    fn scan(row: &Row, include_counts: bool) -> DatabaseResult<Scanned<Self>> {
        let mut reader = row.reader();
        let product = Self {
            id: reader.read_u64()?,
            external_id: reader.read_string()?,
            name: reader.read_string()?,
            quantity_type: reader.read_string()?,
            quantity_value: reader.read_f64()?,
            quantity_notes: reader.read_string()?,
            created_on: reader.read_u64()?,
            last_updated_on: reader.read_optional_u64()?,
            archived_on: reader.read_optional_u64()?,
            belongs_to_recipe_step: reader.read_u64()?,
        };
        Scanned::finish(product, &mut reader, include_counts)
    }
}

impl Entity for RecipeStepProduct {
    const NAME: &'static str = "recipe step product";
    const RESOURCE: AuditResource = AuditResource::RecipeStepProduct;

    type Key = RecipeStepProductKey;
    type Scope = RecipeStepProductScope;
    type Owner = RecipeStepProductOwner;
    type ArchiveKey = RecipeStepProductArchiveKey;
    type CreationInput = RecipeStepProductCreationInput;

    fn id(&self) -> u64 {
        self.id
    }

    fn from_creation_input(input: &Self::CreationInput, id: u64, created_on: u64) -> Self {
        Self {
            id,
            external_id: String::new(),
            name: input.name.clone(),
            quantity_type: input.quantity_type.clone(),
            quantity_value: input.quantity_value,
            quantity_notes: input.quantity_notes.clone(),
            created_on,
            last_updated_on: None,
            archived_on: None,
            belongs_to_recipe_step: input.belongs_to_recipe_step,
        }
    }

    fn query_builder(builder: &dyn SqlQueryBuilder) -> &dyn EntitySqlQueryBuilder<Self> {
        builder.recipe_step_products()
    }
}

/// Persistence contract for recipe step products
#[async_trait]
pub trait RecipeStepProductDataManager: Send + Sync {
    /// Whether the product exists within its recipe step
    async fn recipe_step_product_exists(
        &self,
        ctx: &QueryContext,
        recipe_id: u64,
        recipe_step_id: u64,
        recipe_step_product_id: u64,
    ) -> DatabaseResult<bool>;

    /// Fetch one product of a recipe step
    async fn get_recipe_step_product(
        &self,
        ctx: &QueryContext,
        recipe_id: u64,
        recipe_step_id: u64,
        recipe_step_product_id: u64,
    ) -> DatabaseResult<RecipeStepProduct>;

    /// Count non-archived recipe step products
    async fn get_all_recipe_step_products_count(&self, ctx: &QueryContext)
        -> DatabaseResult<u64>;

    /// Stream every recipe step product to `sink` in parallel batches
    async fn get_all_recipe_step_products(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<RecipeStepProduct>>>,
        batch_size: u16,
    ) -> DatabaseResult<()>;

    /// Stream every recipe step product to `sink` and wait for every batch
    ///
    /// The sink is drained concurrently or holds every batch; otherwise a
    /// full sink blocks the batch tasks and this call never returns.
    async fn get_all_recipe_step_products_joined(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<RecipeStepProduct>>>,
        batch_size: u16,
    ) -> DatabaseResult<BatchStreamReport>;

    /// Fetch one filtered page of a recipe step's products
    async fn get_recipe_step_products(
        &self,
        ctx: &QueryContext,
        recipe_id: u64,
        recipe_step_id: u64,
        filter: Option<&QueryFilter>,
    ) -> DatabaseResult<ListPage<RecipeStepProduct>>;

    /// Fetch a recipe step's products by id
    async fn get_recipe_step_products_with_ids(
        &self,
        ctx: &QueryContext,
        recipe_step_id: u64,
        limit: u8,
        ids: &[u64],
    ) -> DatabaseResult<Vec<RecipeStepProduct>>;

    /// Create a recipe step product with its creation audit entry
    async fn create_recipe_step_product(
        &self,
        ctx: &QueryContext,
        input: Option<&RecipeStepProductCreationInput>,
        created_by: u64,
    ) -> DatabaseResult<RecipeStepProduct>;

    /// Update a recipe step product with its update audit entry
    async fn update_recipe_step_product(
        &self,
        ctx: &QueryContext,
        updated: Option<&RecipeStepProduct>,
        changed_by: u64,
        changes: &[FieldChangeSummary],
    ) -> DatabaseResult<()>;

    /// Archive a recipe step's product with its archive audit entry
    async fn archive_recipe_step_product(
        &self,
        ctx: &QueryContext,
        recipe_step_id: u64,
        recipe_step_product_id: u64,
        archived_by: u64,
    ) -> DatabaseResult<()>;

    /// Audit entries recorded for a recipe step product
    async fn get_audit_log_entries_for_recipe_step_product(
        &self,
        ctx: &QueryContext,
        recipe_step_product_id: u64,
    ) -> DatabaseResult<Vec<AuditLogEntry>>;
}

#[async_trait]
impl RecipeStepProductDataManager for SqlQuerier {
    async fn recipe_step_product_exists(
        &self,
        ctx: &QueryContext,
        recipe_id: u64,
        recipe_step_id: u64,
        recipe_step_product_id: u64,
    ) -> DatabaseResult<bool> {
        let key = RecipeStepProductKey {
            recipe_id,
            recipe_step_id,
            recipe_step_product_id,
        };
        self.entity_exists::<RecipeStepProduct>(ctx, &key).await
    }

    async fn get_recipe_step_product(
        &self,
        ctx: &QueryContext,
        recipe_id: u64,
        recipe_step_id: u64,
        recipe_step_product_id: u64,
    ) -> DatabaseResult<RecipeStepProduct> {
        let key = RecipeStepProductKey {
            recipe_id,
            recipe_step_id,
            recipe_step_product_id,
        };
        self.get_entity(ctx, &key).await
    }

    async fn get_all_recipe_step_products_count(
        &self,
        ctx: &QueryContext,
    ) -> DatabaseResult<u64> {
        self.get_all_entities_count::<RecipeStepProduct>(ctx).await
    }

    async fn get_all_recipe_step_products(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<RecipeStepProduct>>>,
        batch_size: u16,
    ) -> DatabaseResult<()> {
        self.get_all_entities(ctx, sink, batch_size).await
    }

    async fn get_all_recipe_step_products_joined(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<RecipeStepProduct>>>,
        batch_size: u16,
    ) -> DatabaseResult<BatchStreamReport> {
        self.get_all_entities_joined(ctx, sink, batch_size).await
    }

    async fn get_recipe_step_products(
        &self,
        ctx: &QueryContext,
        recipe_id: u64,
        recipe_step_id: u64,
        filter: Option<&QueryFilter>,
    ) -> DatabaseResult<ListPage<RecipeStepProduct>> {
        let scope = RecipeStepProductScope {
            recipe_id,
            recipe_step_id,
        };
        self.get_entities(ctx, &scope, filter).await
    }

    async fn get_recipe_step_products_with_ids(
        &self,
        ctx: &QueryContext,
        recipe_step_id: u64,
        limit: u8,
        ids: &[u64],
    ) -> DatabaseResult<Vec<RecipeStepProduct>> {
        self.get_entities_with_ids(ctx, &RecipeStepProductOwner { recipe_step_id }, limit, ids)
            .await
    }

    async fn create_recipe_step_product(
        &self,
        ctx: &QueryContext,
        input: Option<&RecipeStepProductCreationInput>,
        created_by: u64,
    ) -> DatabaseResult<RecipeStepProduct> {
        self.create_entity::<RecipeStepProduct>(ctx, input, created_by)
            .await
    }

    async fn update_recipe_step_product(
        &self,
        ctx: &QueryContext,
        updated: Option<&RecipeStepProduct>,
        changed_by: u64,
        changes: &[FieldChangeSummary],
    ) -> DatabaseResult<()> {
        self.update_entity(ctx, updated, changed_by, changes).await
    }

    async fn archive_recipe_step_product(
        &self,
        ctx: &QueryContext,
        recipe_step_id: u64,
        recipe_step_product_id: u64,
        archived_by: u64,
    ) -> DatabaseResult<()> {
        let key = RecipeStepProductArchiveKey {
            recipe_step_id,
            recipe_step_product_id,
        };
        self.archive_entity::<RecipeStepProduct>(ctx, &key, archived_by)
            .await
    }

    async fn get_audit_log_entries_for_recipe_step_product(
        &self,
        ctx: &QueryContext,
        recipe_step_product_id: u64,
    ) -> DatabaseResult<Vec<AuditLogEntry>> {
        self.get_audit_log_entries_for_entity::<RecipeStepProduct>(ctx, recipe_step_product_id)
            .await
    }
}
