use crate::config::ShadowConfig;
use crate::geometry::{Point, Size};
use crate::view::CarouselDelegate;
use derive_more::Display;
use std::cell::RefCell;

/// Where a child sits after a layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildLayout {
    pub center: Point,
    pub scale: f64,
    pub hidden: bool,
}

impl Default for ChildLayout {
    fn default() -> Self {
        Self {
            center: Point::default(),
            scale: 1.0,
            hidden: true,
        }
    }
}

impl ChildLayout {
    /// Hit-test in container coordinates against a child of `size` drawn with this layout.
    pub fn contains(&self, size: Size, point: Point) -> bool {
        let (half_w, half_h) = (
            size.width * self.scale / 2.0,
            size.height * self.scale / 2.0,
        );
        let (dx, dy) = (point.x - self.center.x, point.y - self.center.y);
        !self.hidden && dx.abs() <= half_w && dy.abs() <= half_h
    }
}

/// The view system the carousel drives. Everything is keyed by the child's tag.
pub trait CarouselHost {
    fn apply_shadow(&mut self, tag: usize, shadow: &ShadowConfig);
    fn set_child_size(&mut self, tag: usize, size: Size);
    fn apply_child_layout(&mut self, tag: usize, layout: &ChildLayout);
    fn bring_to_front(&mut self, tag: usize);

    /// Device pixels per point.
    fn screen_scale(&self) -> f64 {
        1.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadlessChild {
    pub size: Size,
    pub layout: ChildLayout,
    pub shadow: Option<ShadowConfig>,
}

/// Host without a screen. Keeps whatever the carousel last told it.
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    pub children: Vec<HeadlessChild>,
    /// Back to front.
    pub z_order: Vec<usize>,
    pub scale: f64,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl HeadlessHost {
    pub fn new(scale: f64) -> Self {
        Self {
            children: Vec::new(),
            z_order: Vec::new(),
            scale,
        }
    }

    pub fn child(&self, tag: usize) -> Option<&HeadlessChild> {
        self.children.get(tag)
    }

    pub fn frontmost(&self) -> Option<usize> {
        self.z_order.last().copied()
    }

    fn child_mut(&mut self, tag: usize) -> &mut HeadlessChild {
        if self.children.len() <= tag {
            self.children.resize_with(tag + 1, HeadlessChild::default);
        }
        if !self.z_order.contains(&tag) {
            self.z_order.insert(0, tag);
        }
        &mut self.children[tag]
    }
}

impl CarouselHost for HeadlessHost {
    fn apply_shadow(&mut self, tag: usize, shadow: &ShadowConfig) {
        self.child_mut(tag).shadow = Some(shadow.clone());
    }

    fn set_child_size(&mut self, tag: usize, size: Size) {
        self.child_mut(tag).size = size;
    }

    fn apply_child_layout(&mut self, tag: usize, layout: &ChildLayout) {
        self.child_mut(tag).layout = *layout;
    }

    fn bring_to_front(&mut self, tag: usize) {
        self.child_mut(tag);
        self.z_order.retain(|t| *t != tag);
        self.z_order.push(tag);
    }

    fn screen_scale(&self) -> f64 {
        self.scale
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Notification {
    #[display("swiped to item {_0}")]
    SwipedToItem(usize),
    #[display("item tapped {_0}")]
    ItemTapped(usize),
}

/// Delegate that just remembers what it was told.
#[derive(Debug, Default)]
pub struct RecordingDelegate {
    notifications: RefCell<Vec<Notification>>,
}

impl RecordingDelegate {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.borrow().clone()
    }

    pub fn drain(&self) -> Vec<Notification> {
        self.notifications.borrow_mut().drain(..).collect()
    }
}

impl CarouselDelegate for RecordingDelegate {
    fn did_swipe_to_item(&self, index: usize) {
        self.notifications
            .borrow_mut()
            .push(Notification::SwipedToItem(index));
    }

    fn item_tapped(&self, index: usize) {
        self.notifications
            .borrow_mut()
            .push(Notification::ItemTapped(index));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_respects_scale() {
        let layout = ChildLayout {
            center: Point::new(100.0, 50.0),
            scale: 0.5,
            hidden: false,
        };
        let size = Size::new(80.0, 40.0);
        assert!(layout.contains(size, Point::new(100.0, 50.0)));
        assert!(layout.contains(size, Point::new(119.0, 59.0)));
        assert!(!layout.contains(size, Point::new(121.0, 50.0)));
        assert!(!layout.contains(size, Point::new(100.0, 61.0)));
    }

    #[test]
    fn test_hidden_child_is_never_hit() {
        let layout = ChildLayout {
            center: Point::new(0.0, 0.0),
            scale: 1.0,
            hidden: true,
        };
        assert!(!layout.contains(Size::new(10.0, 10.0), Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_headless_z_order() {
        let mut host = HeadlessHost::default();
        host.apply_shadow(0, &ShadowConfig::default());
        host.apply_shadow(1, &ShadowConfig::default());
        host.bring_to_front(0);
        assert_eq!(host.frontmost(), Some(0));
        host.bring_to_front(1);
        assert_eq!(host.z_order, vec![0, 1]);
        assert_eq!(host.children.len(), 2);
    }

    #[test]
    fn test_recording_delegate() {
        let delegate = RecordingDelegate::default();
        delegate.did_swipe_to_item(2);
        delegate.item_tapped(2);
        assert_eq!(
            delegate.notifications(),
            vec![Notification::SwipedToItem(2), Notification::ItemTapped(2)]
        );
        assert_eq!(delegate.drain().len(), 2);
        assert!(delegate.notifications().is_empty());
        assert_eq!(Notification::ItemTapped(3).to_string(), "item tapped 3");
    }
}
