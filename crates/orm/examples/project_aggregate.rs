//! Aggregate life-cycle walkthrough
//!
//! Defines a two-entity aggregate (a project owning its tasks), registers
//! the metadata, and drives create/update/delete arrangement over the
//! embedded in-memory store.

use std::any::Any;

use serde::{Deserialize, Serialize};

use arbor_orm::{
    create_relationship_manager, Children, CollectionAccessor, CollectionDescriptor, DomainEvent,
    Entity, EntityDef, EntityDescriptor, EntityId, EntityRegistry, MemorySession, OrmResult,
    Reference, ReferenceAccessor, ReferenceDescriptor, StoreSession,
};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Project {
    id: EntityId,
    name: String,
    tasks: Children<Task>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Task {
    id: EntityId,
    title: String,
    project: Reference<Project>,
}

impl Entity for Project {
    fn entity_type(&self) -> &'static str {
        "Project"
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl EntityDef for Project {
    fn entity_name() -> &'static str {
        "Project"
    }

    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::new::<Project>("Project")
            .aggregate_root()
            .with_collection(CollectionDescriptor::new(
                "tasks",
                "Task",
                CollectionAccessor::of::<Project, Task, _, _>(|p| &p.tasks, |p| &mut p.tasks),
            ))
    }
}

impl Entity for Task {
    fn entity_type(&self) -> &'static str {
        "Task"
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl EntityDef for Task {
    fn entity_name() -> &'static str {
        "Task"
    }

    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::new::<Task>("Task").with_reference(
            ReferenceDescriptor::new(
                "project",
                "Project",
                ReferenceAccessor::of::<Task, Project, _, _>(|t| &t.project, |t| &mut t.project),
            )
            .parent(),
        )
    }
}

fn task(title: &str) -> Task {
    Task {
        title: title.to_string(),
        ..Task::default()
    }
}

fn main() -> OrmResult<()> {
    EntityRegistry::global().register::<Project>()?;
    EntityRegistry::global().register::<Task>()?;

    let mut session = MemorySession::new();

    // create: the aggregate root and every owned child are inserted together
    let mut project = Project {
        name: "launch".to_string(),
        tasks: Children::from_vec(vec![task("design"), task("build"), task("ship")]),
        ..Project::default()
    };
    session.insert(&mut project)?;

    let mut manager = create_relationship_manager(DomainEvent::Created)?;
    manager.prepare_relationships(&mut session, &mut project)?;
    session.save_changes()?;
    manager.restore_references(&mut project);

    println!(
        "created project {} with {} tasks",
        project.id,
        session.committed_count("Task")
    );

    // update: drop one task, add another; the store ends up with the diff
    let kept: Vec<Task> = project
        .tasks
        .take_all()
        .unwrap_or_default()
        .into_iter()
        .filter(|t| t.title != "build")
        .collect();
    project.tasks.set_all(kept);
    project.tasks.push(task("announce"));

    let mut manager = create_relationship_manager(DomainEvent::Updated)?;
    manager.prepare_relationships(&mut session, &mut project)?;
    session.save_changes()?;
    manager.restore_references(&mut project);

    println!(
        "after update the store holds {} tasks",
        session.committed_count("Task")
    );

    // delete: removing the root cascades to every persisted child
    let mut manager = create_relationship_manager(DomainEvent::Deleted)?;
    manager.prepare_relationships(&mut session, &mut project)?;
    session.remove(&project)?;
    session.save_changes()?;

    println!(
        "after delete the store holds {} tasks",
        session.committed_count("Task")
    );
    Ok(())
}
