//! Integration tests for the component ownership tree.

use kiln_core::{
    Awake, Component, ComponentHelper, CoreConfig, CoreContext, CoreError, Handle, Id,
    Identified, Node, Poolable, Pooled,
};

#[derive(Default)]
struct Scene {
    node: Node,
}

impl Identified for Scene {
    fn id(&self) -> Id {
        self.node.id()
    }
}

impl Poolable for Scene {
    fn clear(&mut self) {
        self.node.clear();
    }
}

impl Component for Scene {
    fn node(&self) -> &Node {
        &self.node
    }

    fn node_mut(&mut self) -> &mut Node {
        &mut self.node
    }
}

impl Awake for Scene {
    fn awake(&mut self, (): ()) {}
}

#[derive(Default)]
struct Unit {
    node: Node,
    name: String,
    level: u32,
}

impl Identified for Unit {
    fn id(&self) -> Id {
        self.node.id()
    }
}

impl Poolable for Unit {
    fn clear(&mut self) {
        self.node.clear();
        self.name.clear();
        self.level = 0;
    }
}

impl Component for Unit {
    fn node(&self) -> &Node {
        &self.node
    }

    fn node_mut(&mut self) -> &mut Node {
        &mut self.node
    }
}

impl Awake for Unit {
    fn awake(&mut self, (): ()) {
        self.level = 1;
    }
}

impl Awake<(&str, u32)> for Unit {
    fn awake(&mut self, (name, level): (&str, u32)) {
        self.name = name.to_owned();
        self.level = level;
    }
}

#[derive(Default)]
struct Buff {
    node: Node,
}

impl Identified for Buff {
    fn id(&self) -> Id {
        self.node.id()
    }
}

impl Poolable for Buff {
    fn clear(&mut self) {
        self.node.clear();
    }
}

impl Component for Buff {
    fn node(&self) -> &Node {
        &self.node
    }

    fn node_mut(&mut self) -> &mut Node {
        &mut self.node
    }
}

impl Awake for Buff {
    fn awake(&mut self, (): ()) {}
}

fn context() -> CoreContext {
    CoreContext::new(CoreConfig {
        strict_check: true,
        ..CoreConfig::default()
    })
}

#[test]
fn test_add_and_remove_by_type() {
    let ctx = context();
    let parent = ctx.spawn_component::<Scene, _>(1, ());

    let a = parent.add_component_with_id::<Unit, _>(&ctx, 5, ()).unwrap();
    let b = parent.add_component_with_id::<Unit, _>(&ctx, 6, ()).unwrap();
    assert_eq!(parent.child_count(), 2);

    let first = parent.get_component::<Unit>().unwrap();
    assert!(Pooled::ptr_eq(&first, &a) || Pooled::ptr_eq(&first, &b));
    assert_eq!(parent.get_components::<Unit>().len(), 2);

    assert_eq!(parent.remove_components::<Unit>(ctx.pool()).unwrap(), 2);
    assert!(parent.get_component::<Unit>().is_none());
    assert!(parent.get_components::<Unit>().is_empty());
    assert_eq!(ctx.pool().info::<Unit>().unwrap().unused, 2);
}

#[test]
fn test_awake_receives_arguments() {
    let ctx = context();
    let parent = ctx.spawn_component::<Scene, _>(0, ());
    assert_ne!(parent.read().id(), 0);

    let unit = parent
        .add_component::<Unit, _>(&ctx, ("archer", 7))
        .unwrap();
    let unit = unit.read();
    assert_eq!(unit.name, "archer");
    assert_eq!(unit.level, 7);
    assert_eq!(unit.node().parent(), Some(parent.read().id()));
}

#[test]
fn test_get_by_id_checks_type() {
    let ctx = context();
    let parent = ctx.spawn_component::<Scene, _>(1, ());
    parent.add_component_with_id::<Unit, _>(&ctx, 5, ()).unwrap();

    assert!(parent.get_component_by_id::<Unit>(5).is_some());
    assert!(parent.get_component_by_id::<Buff>(5).is_none());
    assert!(parent.get_component_by_id::<Unit>(99).is_none());
}

#[test]
fn test_removing_missing_child_is_noop() {
    let ctx = context();
    let parent = ctx.spawn_component::<Scene, _>(1, ());

    assert!(!parent.remove_component_by_id(ctx.pool(), 42).unwrap());
    assert_eq!(parent.remove_components::<Buff>(ctx.pool()).unwrap(), 0);
}

#[test]
fn test_remove_releases_subtree() {
    let ctx = context();
    let parent = ctx.spawn_component::<Scene, _>(1, ());
    let unit = parent.add_component_with_id::<Unit, _>(&ctx, 5, ()).unwrap();
    unit.add_component::<Buff, _>(&ctx, ()).unwrap();
    unit.add_component::<Buff, _>(&ctx, ()).unwrap();

    assert!(parent.remove_component_ref(ctx.pool(), &unit).unwrap());
    assert_eq!(parent.child_count(), 0);
    assert_eq!(ctx.pool().info::<Buff>().unwrap().unused, 2);
    assert_eq!(ctx.pool().info::<Unit>().unwrap().unused, 1);
    // Cleared on release
    assert_eq!(unit.read().id(), 0);
    assert_eq!(unit.read().node().child_count(), 0);
}

#[test]
fn test_duplicate_child_id_is_rejected() {
    let ctx = context();
    let parent = ctx.spawn_component::<Scene, _>(1, ());
    parent.add_component_with_id::<Unit, _>(&ctx, 5, ()).unwrap();

    let Err(err) = parent.add_component_with_id::<Buff, _>(&ctx, 5, ()) else {
        panic!("duplicate child id was accepted");
    };
    assert_eq!(err, CoreError::DuplicateChild { parent: 1, id: 5 });
    // The rejected object went back to the pool
    assert_eq!(ctx.pool().info::<Buff>().unwrap().unused, 1);
}

#[test]
fn test_child_cannot_take_parent_id() {
    let ctx = context();
    let parent = ctx.spawn_component::<Scene, _>(1, ());

    let Err(err) = parent.add_component_with_id::<Unit, _>(&ctx, 1, ()) else {
        panic!("child took its parent's id");
    };
    assert!(matches!(err, CoreError::SelfParent { id: 1, .. }));
}

#[test]
fn test_reparenting_requires_detach() {
    let ctx = context();
    let left = ctx.spawn_component::<Scene, _>(1, ());
    let right = ctx.spawn_component::<Scene, _>(2, ());
    let unit = left.add_component_with_id::<Unit, _>(&ctx, 5, ()).unwrap();

    let err = right.attach_component(&unit).unwrap_err();
    assert_eq!(
        err,
        CoreError::AlreadyParented {
            type_name: std::any::type_name::<Unit>(),
            id: 5,
            attempted: 2,
            existing: 1,
        }
    );

    let detached = left.detach_component::<Unit>(5).unwrap();
    assert!(Pooled::ptr_eq(&detached, &unit));
    assert_eq!(left.child_count(), 0);

    right.attach_component(&detached).unwrap();
    assert_eq!(unit.read().node().parent(), Some(2));
    assert!(right.get_component_by_id::<Unit>(5).is_some());
}

#[test]
fn test_component_cannot_parent_itself() {
    let ctx = context();
    let scene = ctx.spawn_component::<Scene, _>(1, ());

    let err = scene.attach_component(&scene).unwrap_err();
    assert!(matches!(err, CoreError::SelfParent { .. }));
}

#[test]
fn test_ancestor_cannot_attach_under_descendant() {
    let ctx = context();
    let scene = ctx.spawn_component::<Scene, _>(1, ());
    let unit = scene.add_component_with_id::<Unit, _>(&ctx, 5, ()).unwrap();
    let buff = unit.add_component_with_id::<Buff, _>(&ctx, 9, ()).unwrap();

    let err = unit.attach_component(&scene).unwrap_err();
    assert_eq!(
        err,
        CoreError::Cycle {
            type_name: std::any::type_name::<Scene>(),
            id: 1,
            parent: 5,
        }
    );
    assert!(matches!(buff.attach_component(&scene), Err(CoreError::Cycle { parent: 9, .. })));
    assert_eq!(buff.child_count(), 0);
    assert_eq!(scene.read().node().parent(), None);
    drop((unit, buff));

    // Every object goes back to the pool exactly once
    ctx.destroy_component(scene).unwrap();
    let pool = ctx.pool();
    for info in [pool.info::<Scene>(), pool.info::<Unit>(), pool.info::<Buff>()] {
        let info = info.unwrap();
        assert_eq!((info.unused, info.using, info.released), (1, 0, 1));
    }
    let first = pool.acquire::<Scene>();
    let second = pool.acquire::<Scene>();
    assert!(!Pooled::ptr_eq(&first, &second));
}

#[test]
fn test_handle_to_removed_component_goes_stale() {
    let ctx = context();
    let parent = ctx.spawn_component::<Scene, _>(1, ());
    let unit = parent.add_component_with_id::<Unit, _>(&ctx, 5, ()).unwrap();
    let mut handle = Handle::from(&unit);
    drop(unit);

    parent.remove_component_by_id(ctx.pool(), 5).unwrap();
    let reused = parent.add_component_with_id::<Unit, _>(&ctx, 6, ()).unwrap();

    assert_eq!(handle.id(), 5);
    assert!(handle.resolve().is_none());
    assert_eq!(reused.read().id(), 6);
}

#[test]
fn test_destroy_root_releases_everything() {
    let ctx = context();
    let scene = ctx.spawn_component::<Scene, _>(1, ());
    let unit = scene.add_component::<Unit, _>(&ctx, ()).unwrap();
    unit.add_component::<Buff, _>(&ctx, ()).unwrap();

    ctx.destroy_component(scene).unwrap();

    let pool = ctx.pool();
    assert_eq!(pool.info::<Scene>().unwrap().unused, 1);
    assert_eq!(pool.info::<Unit>().unwrap().unused, 1);
    assert_eq!(pool.info::<Buff>().unwrap().unused, 1);
}
