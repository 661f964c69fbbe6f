use std::time::{Duration, Instant};

use env_logger::Env;
use iced::widget::{button, column, container, row, text};
use iced::{Color, Element, Length, Size, Subscription, Task};
use scope_ui_tree::{
    RowHeight, TREE_SCROLL_ID, TreeEvent, TreeKey, TreeNode, TreeRowContext,
    TreeSettings, TreeState, TreeView, effect_task, nodes_or_empty,
};

const FOLLOW_TICK_MS: u64 = 16;
const SUFFIX_HEIGHT: f32 = 56.0;

fn main() -> iced::Result {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    iced::application(App::new, App::update, App::view)
        .title(App::title)
        .window_size(Size {
            width: 720.0,
            height: 640.0,
        })
        .subscription(App::subscription)
        .run()
}

#[derive(Debug, Clone)]
enum Message {
    Tree(TreeEvent),
    Clicked(TreeNode),
    FollowNext,
}

struct App {
    tree: TreeState,
    follow_targets: Vec<TreeKey>,
    follow_cursor: usize,
    last_clicked: Option<String>,
}

impl App {
    fn new() -> (Self, Task<Message>) {
        let settings = TreeSettings::from_json(r#"{"expand_depth": 1}"#)
            .unwrap_or_else(|err| {
                log::warn!("demo settings rejected: {err}");
                TreeSettings::default()
            });

        let mut data = nodes_or_empty(WORKSPACE_JSON);
        data.extend(symbol_outline(400, 6, 12));

        let mut tree = TreeState::with_data(data, settings);
        tree.set_suffix(true);
        tree.set_row_height(RowHeight::per_row(|_, is_suffix| {
            if is_suffix { SUFFIX_HEIGHT } else { 24.0 }
        }));

        let follow_targets = vec![
            String::from("f0/c0"),
            String::from("f120/c3"),
            String::from("f399/c5"),
            String::from("f42/c1"),
        ];

        (
            Self {
                tree,
                follow_targets,
                follow_cursor: 0,
                last_clicked: None,
            },
            Task::none(),
        )
    }

    fn title(&self) -> String {
        String::from("virtual_tree")
    }

    fn subscription(&self) -> Subscription<Message> {
        if !self.tree.has_pending_scroll() {
            return Subscription::none();
        }

        iced::time::every(Duration::from_millis(FOLLOW_TICK_MS))
            .map(|now| Message::Tree(TreeEvent::Tick { now }))
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tree(event) => match self.tree.update(event) {
                Some(effect) => {
                    effect_task(effect, TREE_SCROLL_ID, Message::Clicked)
                },
                None => Task::none(),
            },
            Message::Clicked(node) => {
                log::info!("clicked {}", node.key());
                self.last_clicked = Some(node.key().to_owned());
                Task::none()
            },
            Message::FollowNext => {
                let Some(key) =
                    self.follow_targets.get(self.follow_cursor).cloned()
                else {
                    return Task::none();
                };
                self.follow_cursor =
                    (self.follow_cursor + 1) % self.follow_targets.len();

                let event = TreeEvent::ScrollToKey {
                    key,
                    now: Instant::now(),
                };
                self.update(Message::Tree(event))
            },
        }
    }

    fn view(&self) -> Element<'_, Message> {
        let status = match &self.last_clicked {
            Some(key) => format!("selected: {key}"),
            None => String::from("nothing selected"),
        };
        let toolbar = row![
            button(text("Follow next symbol")).on_press(Message::FollowNext),
            text(status),
        ]
        .spacing(12);

        let tree = TreeView::new(&self.tree, Message::Tree, render_row)
            .toggle_content(toggle_icon)
            .suffix(render_suffix)
            .row_style(row_style)
            .view();

        container(column![toolbar, tree].spacing(8))
            .padding(8)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

fn render_row<'a>(context: &TreeRowContext<'a>) -> Element<'a, Message> {
    container(text(context.row.title.clone()).size(13))
        .padding([0, 4])
        .width(Length::Fill)
        .into()
}

fn render_suffix<'a>(context: &TreeRowContext<'a>) -> Element<'a, Message> {
    let line = format!("row {} details", context.index);
    container(text(line).size(12))
        .padding([4, 8])
        .width(Length::Fill)
        .into()
}

fn toggle_icon<'a>(context: &TreeRowContext<'a>) -> Element<'a, Message> {
    let icon = if context.is_expanded { "v" } else { ">" };
    text(icon).size(12).into()
}

fn row_style(context: &TreeRowContext<'_>) -> container::Style {
    let background = if context.is_selected {
        Some(Color::from_rgb(0.12, 0.26, 0.46).into())
    } else if context.is_hovered {
        Some(Color::from_rgb(0.18, 0.18, 0.18).into())
    } else if context.row.is_suffix() {
        Some(Color::from_rgb(0.10, 0.10, 0.12).into())
    } else {
        None
    };

    container::Style {
        background,
        text_color: Some(Color::from_rgb(0.9, 0.9, 0.9)),
        ..Default::default()
    }
}

fn symbol_outline(
    files: usize,
    contracts: usize,
    functions: usize,
) -> Vec<TreeNode> {
    (0..files)
        .map(|file| {
            let contracts = (0..contracts)
                .map(|contract| {
                    let functions = (0..functions)
                        .map(|function| {
                            TreeNode::leaf(
                                format!("f{file}/c{contract}/fn{function}"),
                                format!("function{function}()"),
                            )
                        })
                        .collect();
                    TreeNode::new(
                        format!("f{file}/c{contract}"),
                        format!("Contract{contract}"),
                        functions,
                    )
                })
                .collect();
            TreeNode::new(
                format!("f{file}"),
                format!("src/File{file}.sol"),
                contracts,
            )
        })
        .collect()
}

const WORKSPACE_JSON: &str = r#"[
    {
        "key": "__scope_tree_root__",
        "title": "workspace",
        "children": [
            { "key": "readme", "title": "README.md" },
            { "key": "foundry", "title": "foundry.toml" }
        ]
    }
]"#;
