use super::*;

impl PermissionResolutionService {
    /// Returns the strongest level `actor_id` holds on one instance.
    ///
    /// Pass [`EntityId::ALL`] for type-level checks such as Create. Direct
    /// grants, role grants and one-hop parent inheritance combine by maximum;
    /// `None` means no source matched and flattens to
    /// [`accessgate_domain::NO_ACCESS_LEVEL`].
    pub async fn max_level(
        &self,
        actor_id: ActorId,
        entity_type: &EntityTypeCode,
        entity_id: EntityId,
    ) -> AppResult<Option<PermissionLevel>> {
        let now = Utc::now();
        let grantees = self.resolve_grantees(actor_id).await?;

        let scope_ids = if entity_id.is_all() {
            vec![EntityId::ALL]
        } else {
            vec![EntityId::ALL, entity_id]
        };
        let grants = self
            .load_grants(&grantees, entity_type, Some(scope_ids), None, now)
            .await?;
        let granted = PermissionGrant::strongest_covering(&grants, entity_id, now);

        let resolved = if granted.is_some_and(|level| level.satisfies(InheritanceRule::ceiling())) {
            granted
        } else {
            granted.max(
                self.inherited_level(&grantees, entity_type, entity_id, now)
                    .await?,
            )
        };

        debug!(
            actor_id = %actor_id,
            entity_type = %entity_type,
            entity_id = %entity_id,
            role_count = grantees.role_ids.len(),
            level = PermissionLevel::value_or_no_access(resolved),
            "resolved max permission level"
        );

        Ok(resolved)
    }

    /// Integer form of [`Self::max_level`], using
    /// [`accessgate_domain::NO_ACCESS_LEVEL`] for no access.
    pub async fn max_level_value(
        &self,
        actor_id: ActorId,
        entity_type: &EntityTypeCode,
        entity_id: EntityId,
    ) -> AppResult<i16> {
        self.max_level(actor_id, entity_type, entity_id)
            .await
            .map(PermissionLevel::value_or_no_access)
    }

    async fn inherited_level(
        &self,
        grantees: &Grantees,
        entity_type: &EntityTypeCode,
        entity_id: EntityId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<PermissionLevel>> {
        let parent_types = self.parent_types_of(entity_type).await?;
        if parent_types.is_empty() {
            return Ok(None);
        }

        // A type-level target has no links; any parent access counts.
        if entity_id.is_all() {
            let mut strongest = None;
            for parent_type in &parent_types {
                let grants = self
                    .load_grants(grantees, parent_type, None, None, now)
                    .await?;
                strongest = strongest.max(ParentLevels::from_grants(&grants).strongest_anywhere());
            }

            return Ok(strongest.and_then(InheritanceRule::inherited_level));
        }

        let links = self
            .relationship_store
            .find_active_links(
                &LinkQuery::children_of(parent_types, entity_type.clone())
                    .with_child_ids(vec![entity_id]),
            )
            .await?;

        let mut linked_parents: BTreeMap<EntityTypeCode, BTreeSet<EntityId>> = BTreeMap::new();
        for link in links.iter().filter(|link| link.is_active()) {
            linked_parents
                .entry(link.parent_type().clone())
                .or_default()
                .insert(link.parent_id());
        }

        let mut strongest = None;
        for (parent_type, parent_ids) in &linked_parents {
            let scope_ids = parent_ids
                .iter()
                .copied()
                .chain([EntityId::ALL])
                .collect::<Vec<_>>();
            let grants = self
                .load_grants(grantees, parent_type, Some(scope_ids), None, now)
                .await?;
            strongest = strongest.max(ParentLevels::from_grants(&grants).strongest_for(parent_ids));
        }

        Ok(strongest.and_then(InheritanceRule::inherited_level))
    }
}
