use std::rc::Rc;

use iced::alignment;
use iced::widget::{Column, Row, Space, container, mouse_area, scrollable};
use iced::{Element, Length, Task, mouse};

use crate::event::{TreeEffect, TreeEvent};
use crate::model::{FlattenedRow, TreeNode};
use crate::state::TreeState;

/// Default widget id of the tree scrollable.
pub const TREE_SCROLL_ID: &str = "scope_tree_scroll";

/// Rendering context passed to row callbacks.
pub struct TreeRowContext<'a> {
    pub row: FlattenedRow<'a>,
    /// Position among all flattened rows, not only the materialized ones.
    pub index: usize,
    pub height: f32,
    pub is_selected: bool,
    pub is_hovered: bool,
    pub is_expanded: bool,
}

type RowRenderer<'a, Message> =
    dyn Fn(&TreeRowContext<'a>) -> Element<'a, Message> + 'a;
type RowStyle<'a> = dyn Fn(&TreeRowContext<'a>) -> container::Style + 'a;
type EventAction<'a, Message> = dyn Fn(TreeEvent) -> Message + 'a;

/// Virtualized tree view over a [`TreeState`].
///
/// Only the rows of the current window are built; spacers above and below
/// keep the scrollable extent equal to the full content height.
pub struct TreeView<'a, Message: Clone + 'a> {
    state: &'a TreeState,
    on_event: Rc<EventAction<'a, Message>>,
    render_row: Box<RowRenderer<'a, Message>>,
    render_suffix: Option<Box<RowRenderer<'a, Message>>>,
    toggle_content: Option<Box<RowRenderer<'a, Message>>>,
    row_style: Option<Box<RowStyle<'a>>>,
    id: &'static str,
    indent_width: f32,
    toggle_width: f32,
}

impl<'a, Message> TreeView<'a, Message>
where
    Message: Clone + 'a,
{
    /// Create a tree view rendering each node row with `render_row` and
    /// reporting interaction through `on_event`.
    pub fn new(
        state: &'a TreeState,
        on_event: impl Fn(TreeEvent) -> Message + 'a,
        render_row: impl Fn(&TreeRowContext<'a>) -> Element<'a, Message> + 'a,
    ) -> Self {
        let settings = state.settings();
        Self {
            state,
            on_event: Rc::new(on_event),
            render_row: Box::new(render_row),
            render_suffix: None,
            toggle_content: None,
            row_style: None,
            id: TREE_SCROLL_ID,
            indent_width: settings.indent_width.max(0.0),
            toggle_width: settings.toggle_width.max(0.0),
        }
    }

    /// Content of the auxiliary row shown after the selected node.
    pub fn suffix(
        mut self,
        render_suffix: impl Fn(&TreeRowContext<'a>) -> Element<'a, Message> + 'a,
    ) -> Self {
        self.render_suffix = Some(Box::new(render_suffix));
        self
    }

    /// Content of the expand/collapse slot for rows with children.
    pub fn toggle_content(
        mut self,
        toggle_content: impl Fn(&TreeRowContext<'a>) -> Element<'a, Message> + 'a,
    ) -> Self {
        self.toggle_content = Some(Box::new(toggle_content));
        self
    }

    /// Container style for each row, chosen from its context.
    pub fn row_style(
        mut self,
        row_style: impl Fn(&TreeRowContext<'a>) -> container::Style + 'a,
    ) -> Self {
        self.row_style = Some(Box::new(row_style));
        self
    }

    /// Widget id used by [`scroll_task`]; needed when several trees are
    /// mounted at once.
    pub fn id(mut self, id: &'static str) -> Self {
        self.id = id;
        self
    }

    /// Set indentation width per tree depth level.
    pub fn indent_width(mut self, width: f32) -> Self {
        self.indent_width = width.max(0.0);
        self
    }

    /// Set the width reserved for the toggle area.
    pub fn toggle_width(mut self, width: f32) -> Self {
        self.toggle_width = width.max(0.0);
        self
    }

    /// Build the `Element` for the tree view.
    pub fn view(self) -> Element<'a, Message> {
        let state = self.state;
        let window = state.virtual_window();
        let range = state.window();

        let mut column = Column::new().width(Length::Fill);
        if range.top_padding > 0.0 {
            column = column.push(
                Space::new()
                    .width(Length::Fill)
                    .height(Length::Fixed(range.top_padding)),
            );
        }

        for (index, row) in state.materialized_rows() {
            let key = row.key();
            let context = TreeRowContext {
                index,
                height: window.row_height(index).unwrap_or_default(),
                is_selected: !row.is_suffix()
                    && state.selected_key() == Some(key),
                is_hovered: state.hovered_key() == Some(key),
                is_expanded: state.is_expanded(key),
                row,
            };
            column = column.push(self.row_element(&context));
        }

        if range.bottom_padding > 0.0 {
            column = column.push(
                Space::new()
                    .width(Length::Fill)
                    .height(Length::Fixed(range.bottom_padding)),
            );
        }

        let height = state
            .settings()
            .height
            .map(Length::Fixed)
            .unwrap_or(Length::Fill);
        let on_event = Rc::clone(&self.on_event);

        scrollable::Scrollable::new(column)
            .id(self.id)
            .width(Length::Fill)
            .height(height)
            .direction(scrollable::Direction::Vertical(
                scrollable::Scrollbar::new()
                    .width(4)
                    .margin(0)
                    .scroller_width(4),
            ))
            .on_scroll(move |viewport| {
                on_event(TreeEvent::Scrolled {
                    offset: viewport.absolute_offset().y,
                    viewport_height: viewport.bounds().height,
                })
            })
            .into()
    }

    fn row_element(&self, context: &TreeRowContext<'a>) -> Element<'a, Message> {
        let mut row = Row::new()
            .height(Length::Fill)
            .align_y(alignment::Vertical::Center);

        let indent = context.row.depth as f32 * self.indent_width;
        if indent > 0.0 {
            row = row.push(Space::new().width(Length::Fixed(indent)));
        }

        if context.row.is_suffix() {
            let content = self
                .render_suffix
                .as_ref()
                .map(|render| render(context))
                .unwrap_or_else(|| Space::new().into());
            row = row.push(content);
        } else {
            if self.toggle_width > 0.0 {
                row = row.push(self.toggle_slot(context));
            }
            let content = (self.render_row)(context);
            row = row.push(self.wrap_row_area(content, context.row.key()));
        }

        let mut element: Element<'a, Message> = container(row)
            .width(Length::Fill)
            .height(Length::Fixed(context.height))
            .clip(true)
            .into();

        if let Some(ref row_style) = self.row_style {
            let style = row_style(context);
            element = container(element).style(move |_| style).into();
        }

        element
    }

    /// Toggle slot sits beside the row content so a toggle click never
    /// reaches the row press handler.
    fn toggle_slot(&self, context: &TreeRowContext<'a>) -> Element<'a, Message> {
        let content = if context.row.has_children() {
            self.toggle_content
                .as_ref()
                .map(|toggle| toggle(context))
                .unwrap_or_else(|| Space::new().into())
        } else {
            Space::new().into()
        };

        let slot: Element<'a, Message> = container(content)
            .width(Length::Fixed(self.toggle_width))
            .height(Length::Fill)
            .align_x(alignment::Horizontal::Center)
            .align_y(alignment::Vertical::Center)
            .into();

        if !context.row.has_children() {
            return slot;
        }

        let key = context.row.key().to_owned();
        mouse_area(slot)
            .on_press((self.on_event)(TreeEvent::ToggleRequested { key }))
            .interaction(mouse::Interaction::Pointer)
            .into()
    }

    fn wrap_row_area(
        &self,
        content: Element<'a, Message>,
        key: &str,
    ) -> Element<'a, Message> {
        let mut area = mouse_area(content)
            .on_enter((self.on_event)(TreeEvent::RowHovered {
                key: Some(key.to_owned()),
            }))
            .on_exit((self.on_event)(TreeEvent::RowHovered { key: None }));

        if self.state.is_selectable(key) {
            area = area
                .on_press((self.on_event)(TreeEvent::RowPressed {
                    key: key.to_owned(),
                }))
                .interaction(mouse::Interaction::Pointer);
        }

        area.into()
    }
}

/// Task moving the tree scrollable with `id` to `offset`.
pub fn scroll_task<Message>(id: &'static str, offset: f32) -> Task<Message>
where
    Message: Send + 'static,
{
    iced::widget::operation::scroll_to(
        id,
        scrollable::AbsoluteOffset { x: 0.0, y: offset },
    )
}

/// Turn a tree effect into a runtime task.
///
/// Clicks are handed to `on_click`; scroll effects become a scroll
/// operation on the scrollable with `id`.
pub fn effect_task<Message>(
    effect: TreeEffect,
    id: &'static str,
    on_click: impl FnOnce(TreeNode) -> Message,
) -> Task<Message>
where
    Message: Send + 'static,
{
    match effect {
        TreeEffect::Clicked(node) => Task::done(on_click(node)),
        TreeEffect::ScrollTo { offset } => scroll_task(id, offset),
    }
}
