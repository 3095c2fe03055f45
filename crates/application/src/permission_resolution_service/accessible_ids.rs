use super::*;

impl PermissionResolutionService {
    /// Returns every instance of `entity_type` that `actor_id` may access at
    /// `min_level` or above.
    ///
    /// A type-level grant at the requested level returns
    /// [`AccessibleIds::All`] before any instance is enumerated. Otherwise the
    /// result unions direct and role instance grants with the children of
    /// qualifying parent instances. No access is an empty set, not an error.
    pub async fn accessible_ids(
        &self,
        actor_id: ActorId,
        entity_type: &EntityTypeCode,
        min_level: PermissionLevel,
    ) -> AppResult<AccessibleIds> {
        let now = Utc::now();
        let grantees = self.resolve_grantees(actor_id).await?;

        let type_level_grants = self
            .load_grants(
                &grantees,
                entity_type,
                Some(vec![EntityId::ALL]),
                Some(min_level),
                now,
            )
            .await?;
        if !type_level_grants.is_empty() {
            debug!(
                actor_id = %actor_id,
                entity_type = %entity_type,
                min_level = min_level.as_str(),
                "type-level grant covers every instance"
            );
            return Ok(AccessibleIds::All);
        }

        let mut ids: BTreeSet<EntityId> = self
            .load_grants(&grantees, entity_type, None, Some(min_level), now)
            .await?
            .iter()
            .filter(|grant| !grant.is_type_level())
            .map(PermissionGrant::scope_id)
            .collect();

        if let Some(parent_threshold) = InheritanceRule::parent_threshold_for(min_level) {
            ids.extend(
                self.inherited_ids(&grantees, entity_type, min_level, parent_threshold, now)
                    .await?,
            );
        }

        let accessible = AccessibleIds::Only(ids);
        debug!(
            actor_id = %actor_id,
            entity_type = %entity_type,
            min_level = min_level.as_str(),
            accessible = %summarize(&accessible),
            "resolved accessible instances"
        );

        Ok(accessible)
    }

    async fn inherited_ids(
        &self,
        grantees: &Grantees,
        entity_type: &EntityTypeCode,
        min_level: PermissionLevel,
        parent_threshold: PermissionLevel,
        now: DateTime<Utc>,
    ) -> AppResult<BTreeSet<EntityId>> {
        let mut ids = BTreeSet::new();

        for parent_type in self.parent_types_of(entity_type).await? {
            let grants = self
                .load_grants(grantees, &parent_type, None, Some(parent_threshold), now)
                .await?;
            if grants.is_empty() {
                continue;
            }

            let levels = ParentLevels::from_grants(&grants);
            let query = LinkQuery::children_of(vec![parent_type], entity_type.clone());
            let children = if levels.type_level_qualifies(min_level) {
                self.find_children(query).await?
            } else {
                self.find_children(query.with_parent_ids(levels.qualifying_instances(min_level)))
                    .await?
            };
            ids.extend(children);
        }

        Ok(ids)
    }
}
