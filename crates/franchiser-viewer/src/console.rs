//! Interactive terminal explorer.
//!
//! Shows the delegation tree, the selected edge's details, a status bar and
//! a command line. The tree pane and the command line take turns owning the
//! keyboard; Tab switches between them.
//!
//! Launch with `franchiser [OWNER] [DELEGATEE]`.

use std::collections::HashSet;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use franchiser_tree::{NodeKind, NodeRole, SelectionView, SortPolicy, ViewNode};
use franchiser_types::{
    explorer_url, format_votes, normalize_address, short_address, to_checksum_text,
};

use crate::explorer::{Explorer, TreeSnapshot, TreeStatus};

/// Messages kept in the output pane.
const MAX_MESSAGES: usize = 500;

pub struct ConsoleOptions {
    pub sort: SortPolicy,
    /// Shown in the status bar, e.g. the RPC URL or "demo".
    pub endpoint: String,
}

/// One visible line of the tree pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TreeRow {
    pub prefix: String,
    pub key: Address,
    pub franchiser: Option<Address>,
    pub label: String,
    pub extra_text: String,
    pub role: NodeRole,
    pub kind: NodeKind,
    pub is_selected: bool,
    pub collapsed: bool,
}

/// Collapse key: the franchiser, or the address for the owner node.
fn node_key(node: &ViewNode) -> Address {
    node.franchiser.unwrap_or(node.address)
}

/// Flatten the view into rows, skipping the children of collapsed folders.
pub(crate) fn visible_rows(root: &ViewNode, collapsed: &HashSet<Address>) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    push_rows(root, "", true, true, collapsed, &mut rows);
    rows
}

fn push_rows(
    node: &ViewNode,
    prefix: &str,
    is_last: bool,
    is_root: bool,
    collapsed: &HashSet<Address>,
    rows: &mut Vec<TreeRow>,
) {
    let branch = if is_root {
        String::new()
    } else if is_last {
        format!("{prefix}└── ")
    } else {
        format!("{prefix}├── ")
    };
    let key = node_key(node);
    let is_collapsed = node.is_folder() && collapsed.contains(&key);
    rows.push(TreeRow {
        prefix: branch,
        key,
        franchiser: node.franchiser,
        label: node.label.clone(),
        extra_text: node.extra_text.clone(),
        role: node.role,
        kind: node.kind,
        is_selected: node.is_selected,
        collapsed: is_collapsed,
    });
    if is_collapsed {
        return;
    }

    let child_prefix = if is_root {
        String::new()
    } else if is_last {
        format!("{prefix}    ")
    } else {
        format!("{prefix}│   ")
    };
    for (i, child) in node.children.iter().enumerate() {
        push_rows(child, &child_prefix, i + 1 == node.children.len(), false, collapsed, rows);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Tree,
    Input,
}

enum KeyAction {
    None,
    Submit,
    Quit,
}

struct ConsoleSnapshot {
    tree: TreeSnapshot,
    view: Option<ViewNode>,
    selection: Option<SelectionView>,
    owner_label: String,
    delegatee_label: String,
}

struct Console {
    explorer: Arc<Explorer>,
    sort: SortPolicy,
    endpoint: String,
    focus: Focus,
    input: String,
    cursor_pos: usize,
    history: Vec<String>,
    history_pos: Option<usize>,
    /// Row under the cursor in the tree pane.
    cursor: usize,
    collapsed: HashSet<Address>,
    console_messages: Vec<(chrono::DateTime<chrono::Utc>, String, Color)>,
    /// Generation whose names were last requested.
    named_generation: u64,
    last_status: TreeStatus,
}

impl Console {
    fn new(explorer: Arc<Explorer>, options: ConsoleOptions) -> Self {
        let mut console = Self {
            explorer,
            sort: options.sort,
            endpoint: options.endpoint,
            focus: Focus::Tree,
            input: String::new(),
            cursor_pos: 0,
            history: Vec::new(),
            history_pos: None,
            cursor: 0,
            collapsed: HashSet::new(),
            console_messages: Vec::new(),
            named_generation: 0,
            last_status: TreeStatus::Idle,
        };
        console.add_message("Franchiser explorer ready.", Color::Cyan);
        console.add_message(
            "Up/Down move, Enter selects, Space/Left/Right fold, Tab for commands (/help).",
            Color::DarkGray,
        );
        console
    }

    fn snapshot(&self) -> ConsoleSnapshot {
        let tree = self.explorer.snapshot();
        let label = |address: Option<Address>| {
            address.map_or_else(|| "-".to_string(), |a| self.explorer.display_name_for(&a))
        };
        ConsoleSnapshot {
            owner_label: label(tree.owner),
            delegatee_label: label(tree.delegatee),
            view: self.explorer.view(self.sort),
            selection: self.explorer.selection(),
            tree,
        }
    }

    /// React to explorer state changes between frames.
    fn observe(&mut self, snap: &ConsoleSnapshot) {
        if snap.tree.status != self.last_status {
            self.last_status = snap.tree.status;
            match snap.tree.status {
                TreeStatus::Loading => self.add_message("Loading delegations...", Color::Yellow),
                TreeStatus::NoData => self.add_message("No delegations found.", Color::Yellow),
                TreeStatus::Ready => {
                    let (nodes, orphans) = snap
                        .tree
                        .tree
                        .as_ref()
                        .map_or((0, 0), |t| (t.len(), t.orphans().len()));
                    self.add_message(&format!("Loaded {nodes} delegation(s)."), Color::Green);
                    if orphans > 0 {
                        self.add_message(
                            &format!("{orphans} malformed edge(s) left out of the tree."),
                            Color::Red,
                        );
                    }
                }
                TreeStatus::Idle => {}
            }
        }

        if snap.tree.status == TreeStatus::Ready && snap.tree.generation != self.named_generation {
            self.named_generation = snap.tree.generation;
            self.cursor = 0;
            self.collapsed.clear();
            // Names land in the shared cache; later frames pick them up.
            let _ = self.explorer.request_names();
        }
    }

    /// Process the input line. Returns `true` if the console should exit.
    async fn process_input(&mut self) -> bool {
        let input = self.input.trim().to_string();
        self.input.clear();
        self.cursor_pos = 0;
        if input.is_empty() {
            return false;
        }

        self.history.push(input.clone());
        self.history_pos = None;

        if input.starts_with('/') {
            self.process_command(&input).await
        } else {
            self.add_message("Commands start with '/'. Try /help.", Color::Yellow);
            false
        }
    }

    async fn process_command(&mut self, cmd: &str) -> bool {
        let (command, args) = cmd.split_once(' ').unwrap_or((cmd, ""));
        let args = args.trim();

        match command {
            "/help" => {
                self.add_message("Available commands:", Color::Cyan);
                for line in [
                    "  /owner <address|name>     - Set the owner",
                    "  /delegatee <address|name> - Set the delegatee",
                    "  /sort [lexicographic|first-char] - Set or toggle sibling order",
                    "  /refresh                  - Refetch delegations and names",
                    "  /quit                     - Exit",
                    "Tree keys: Up/Down move, Enter select, Space toggle",
                    "           Left/Right fold, Tab switch focus",
                ] {
                    self.add_message(line, Color::White);
                }
            }
            "/owner" | "/delegatee" => {
                if args.is_empty() {
                    self.add_message(&format!("Usage: {command} <address|name>"), Color::Yellow);
                    return false;
                }
                let Some(address) = self.explorer.resolve_party(args).await else {
                    self.add_message(&format!("Could not resolve '{args}'."), Color::Red);
                    return false;
                };
                let current = self.explorer.snapshot();
                let (owner, delegatee) = if command == "/owner" {
                    (Some(address), current.delegatee)
                } else {
                    (current.owner, Some(address))
                };
                self.add_message(
                    &format!("{} set to {}", &command[1..], to_checksum_text(&address)),
                    Color::Green,
                );
                let _ = self.explorer.set_parties(owner, delegatee);
            }
            "/sort" => {
                let next = if args.is_empty() {
                    match self.sort {
                        SortPolicy::Lexicographic => Ok(SortPolicy::FirstChar),
                        SortPolicy::FirstChar => Ok(SortPolicy::Lexicographic),
                    }
                } else {
                    args.parse::<SortPolicy>()
                };
                match next {
                    Ok(policy) => {
                        self.sort = policy;
                        self.add_message(&format!("Sorting siblings by {policy}."), Color::Green);
                    }
                    Err(e) => self.add_message(&e, Color::Red),
                }
            }
            "/refresh" => {
                if self.explorer.refresh().is_some() {
                    self.add_message("Refreshing...", Color::Cyan);
                } else {
                    self.add_message("Set both an owner and a delegatee first.", Color::Yellow);
                }
            }
            "/quit" | "/exit" | "/q" => return true,
            _ => {
                self.add_message(&format!("Unknown command: {command}. Try /help."), Color::Yellow);
            }
        }
        false
    }

    fn add_message(&mut self, msg: &str, color: Color) {
        self.console_messages.push((chrono::Utc::now(), msg.to_string(), color));
        if self.console_messages.len() > MAX_MESSAGES {
            self.console_messages.remove(0);
        }
    }

    fn render(&self, frame: &mut Frame, snap: &ConsoleSnapshot, rows: &[TreeRow]) {
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Min(8),    // Tree + details
                Constraint::Length(5), // Input
            ])
            .split(frame.area());

        self.render_status_bar(frame, outer[0], snap);
        self.render_main_area(frame, outer[1], snap, rows);
        self.render_input(frame, outer[2]);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect, snap: &ConsoleSnapshot) {
        let block = Block::default()
            .title(" Franchiser Explorer ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let nodes = snap.tree.tree.as_ref().map_or(0, |t| t.len());
        let status_line = Line::from(vec![
            Span::styled("  Owner: ", Style::default().fg(Color::Gray)),
            Span::styled(snap.owner_label.clone(), Style::default().fg(Color::Magenta)),
            Span::styled("  |  Delegatee: ", Style::default().fg(Color::Gray)),
            Span::styled(snap.delegatee_label.clone(), Style::default().fg(Color::Cyan)),
            Span::styled("  |  Status: ", Style::default().fg(Color::Gray)),
            Span::styled(
                snap.tree.status.to_string(),
                Style::default().fg(status_color(snap.tree.status)),
            ),
            Span::styled("  |  Nodes: ", Style::default().fg(Color::Gray)),
            Span::styled(nodes.to_string(), Style::default().fg(Color::Green)),
            Span::styled("  |  Sort: ", Style::default().fg(Color::Gray)),
            Span::styled(self.sort.to_string(), Style::default().fg(Color::White)),
            Span::styled("  |  RPC: ", Style::default().fg(Color::Gray)),
            Span::styled(self.endpoint.clone(), Style::default().fg(Color::LightCyan)),
        ]);

        frame.render_widget(Paragraph::new(status_line).block(block), area);
    }

    fn render_main_area(
        &self,
        frame: &mut Frame,
        area: Rect,
        snap: &ConsoleSnapshot,
        rows: &[TreeRow],
    ) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        self.render_tree(frame, columns[0], snap, rows);

        let right_column = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(10), Constraint::Min(4)])
            .split(columns[1]);

        self.render_details(frame, right_column[0], snap);
        self.render_console_output(frame, right_column[1]);
    }

    fn render_tree(&self, frame: &mut Frame, area: Rect, snap: &ConsoleSnapshot, rows: &[TreeRow]) {
        let border = if self.focus == Focus::Tree { Color::Yellow } else { Color::DarkGray };
        let block = Block::default()
            .title(" Delegation Tree ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));

        if rows.is_empty() {
            let hint = match snap.tree.status {
                TreeStatus::Idle => "  Set an owner and a delegatee (/owner, /delegatee).",
                TreeStatus::Loading => "  Loading...",
                TreeStatus::NoData | TreeStatus::Ready => "  No delegations found.",
            };
            let text = vec![
                Line::from(""),
                Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))),
            ];
            frame.render_widget(Paragraph::new(text).block(block), area);
            return;
        }

        let visible_height = area.height.saturating_sub(2) as usize;
        let scroll = self.cursor.saturating_sub(visible_height.saturating_sub(1));
        let lines: Vec<Line> = rows
            .iter()
            .enumerate()
            .skip(scroll)
            .take(visible_height)
            .map(|(i, row)| tree_row_line(row, self.focus == Focus::Tree && i == self.cursor))
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_details(&self, frame: &mut Frame, area: Rect, snap: &ConsoleSnapshot) {
        let block = Block::default()
            .title(" Selected Delegation ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::LightBlue));

        let Some(selection) = &snap.selection else {
            let text = Paragraph::new(Line::from(Span::styled(
                "  Nothing selected.",
                Style::default().fg(Color::DarkGray),
            )))
            .block(block);
            frame.render_widget(text, area);
            return;
        };

        let edge = &selection.edge;
        let field = |name: &'static str, value: String, color: Color| {
            Line::from(vec![
                Span::styled(format!("  {name:<20}"), Style::default().fg(Color::Gray)),
                Span::styled(value, Style::default().fg(color)),
            ])
        };
        let mut text = vec![
            field("Franchiser", to_checksum_text(&edge.franchiser), Color::White),
            field("Explorer", explorer_url(&edge.franchiser), Color::LightCyan),
            field("Delegator", self.explorer.display_name_for(&edge.delegator), Color::Magenta),
            field("Delegatee", self.explorer.display_name_for(&edge.delegatee), Color::Cyan),
            field("Current Votes", format_votes(edge.votes), Color::Yellow),
            field("Subdelegated Votes", format_votes(selection.subtree_votes), Color::Yellow),
        ];
        if let Some(avatar) = self.explorer.names().peek_avatar(&edge.delegatee) {
            text.push(field("Avatar", avatar, Color::DarkGray));
        }

        frame.render_widget(Paragraph::new(text).block(block), area);
    }

    fn render_console_output(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Console Output ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White));

        let inner_height = area.height.saturating_sub(2) as usize;
        let start = self.console_messages.len().saturating_sub(inner_height);
        let lines: Vec<Line> = self.console_messages[start..]
            .iter()
            .map(|(ts, msg, color)| {
                Line::from(vec![
                    Span::styled(
                        format!("  [{}] ", ts.format("%H:%M:%S")),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(msg.as_str(), Style::default().fg(*color)),
                ])
            })
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let border = if self.focus == Focus::Input { Color::Green } else { Color::DarkGray };
        let block = Block::default()
            .title(" Command (Tab = switch focus, /help = commands, /quit = exit) ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));

        let input_display = if self.input.is_empty() {
            Line::from(vec![
                Span::styled("  > ", Style::default().fg(Color::Green)),
                Span::styled(
                    "/owner, /delegatee, /sort, /refresh...",
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        } else {
            Line::from(vec![
                Span::styled("  > ", Style::default().fg(Color::Green)),
                Span::styled(self.input.as_str(), Style::default().fg(Color::White)),
            ])
        };
        let hint_line = Line::from(Span::styled(
            "  Ctrl+C or /quit to exit  |  Up/Down for history  |  Esc back to tree",
            Style::default().fg(Color::DarkGray),
        ));

        frame.render_widget(
            Paragraph::new(vec![Line::from(""), input_display, hint_line]).block(block),
            area,
        );

        if self.focus == Focus::Input {
            let column = cursor_column(&self.input, self.cursor_pos);
            let cursor_x = area.x.saturating_add(4).saturating_add(column);
            frame.set_cursor_position((cursor_x, area.y + 2));
        }
    }

    fn handle_key(
        &mut self,
        code: KeyCode,
        modifiers: KeyModifiers,
        rows: &[TreeRow],
    ) -> KeyAction {
        if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            return KeyAction::Quit;
        }
        match self.focus {
            Focus::Tree => self.handle_tree_key(code, rows),
            Focus::Input => self.handle_input_key(code),
        }
    }

    fn handle_tree_key(&mut self, code: KeyCode, rows: &[TreeRow]) -> KeyAction {
        let last = rows.len().saturating_sub(1);
        match code {
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => self.cursor = (self.cursor + 1).min(last),
            KeyCode::PageUp => self.cursor = self.cursor.saturating_sub(10),
            KeyCode::PageDown => self.cursor = (self.cursor + 10).min(last),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = last,
            KeyCode::Enter => {
                if let Some(row) = rows.get(self.cursor) {
                    match row.franchiser {
                        Some(franchiser) if self.explorer.select(franchiser) => {
                            self.add_message(&format!("Selected {}", row.label), Color::Cyan);
                        }
                        Some(_) => {}
                        None => self.add_message("The owner is not a delegation.", Color::DarkGray),
                    }
                }
            }
            KeyCode::Char(' ') => {
                if let Some(row) = rows.get(self.cursor).filter(|r| r.kind == NodeKind::Folder) {
                    if !self.collapsed.remove(&row.key) {
                        self.collapsed.insert(row.key);
                    }
                }
            }
            KeyCode::Left => {
                if let Some(row) = rows.get(self.cursor).filter(|r| r.kind == NodeKind::Folder) {
                    self.collapsed.insert(row.key);
                }
            }
            KeyCode::Right => {
                if let Some(row) = rows.get(self.cursor) {
                    self.collapsed.remove(&row.key);
                }
            }
            KeyCode::Tab => self.focus = Focus::Input,
            KeyCode::Char('/') => {
                self.focus = Focus::Input;
                self.input = "/".to_string();
                self.cursor_pos = 1;
            }
            _ => {}
        }
        KeyAction::None
    }

    fn handle_input_key(&mut self, code: KeyCode) -> KeyAction {
        match code {
            KeyCode::Enter => return KeyAction::Submit,
            KeyCode::Esc | KeyCode::Tab => self.focus = Focus::Tree,
            KeyCode::Char(c) => {
                self.input.insert(self.cursor_pos, c);
                self.cursor_pos += c.len_utf8();
            }
            KeyCode::Backspace => {
                if let Some((idx, _)) = self.input[..self.cursor_pos].char_indices().next_back() {
                    self.input.remove(idx);
                    self.cursor_pos = idx;
                }
            }
            KeyCode::Delete => {
                if self.cursor_pos < self.input.len() {
                    self.input.remove(self.cursor_pos);
                }
            }
            KeyCode::Left => {
                if let Some((idx, _)) = self.input[..self.cursor_pos].char_indices().next_back() {
                    self.cursor_pos = idx;
                }
            }
            KeyCode::Right => {
                if let Some(c) = self.input[self.cursor_pos..].chars().next() {
                    self.cursor_pos += c.len_utf8();
                }
            }
            KeyCode::Home => self.cursor_pos = 0,
            KeyCode::End => self.cursor_pos = self.input.len(),
            KeyCode::Up => {
                if !self.history.is_empty() {
                    let pos = match self.history_pos {
                        Some(p) => p.saturating_sub(1),
                        None => self.history.len() - 1,
                    };
                    self.history_pos = Some(pos);
                    self.input = self.history[pos].clone();
                    self.cursor_pos = self.input.len();
                }
            }
            KeyCode::Down => {
                if let Some(pos) = self.history_pos {
                    if pos + 1 < self.history.len() {
                        self.history_pos = Some(pos + 1);
                        self.input = self.history[pos + 1].clone();
                    } else {
                        self.history_pos = None;
                        self.input.clear();
                    }
                    self.cursor_pos = self.input.len();
                }
            }
            _ => {}
        }
        KeyAction::None
    }
}

fn tree_row_line(row: &TreeRow, under_cursor: bool) -> Line<'static> {
    let fold = match (row.kind, row.collapsed) {
        (NodeKind::Folder, true) => "▸ ",
        (NodeKind::Folder, false) => "▾ ",
        (NodeKind::Leaf, _) => "  ",
    };
    let label_color = match row.role {
        NodeRole::Owner => Color::Magenta,
        NodeRole::Delegatee => Color::Cyan,
        NodeRole::Subdelegatee => Color::White,
    };
    let mut label_style = Style::default().fg(label_color);
    if row.is_selected {
        label_style = label_style.add_modifier(Modifier::BOLD);
    }
    if under_cursor {
        label_style = label_style.bg(Color::DarkGray);
    }
    // Unnamed parties show as short addresses; the detail panel has them whole.
    let label = short_label(&row.label);

    let mut spans = vec![
        Span::styled(format!("  {}", row.prefix), Style::default().fg(Color::DarkGray)),
        Span::styled(fold, Style::default().fg(Color::DarkGray)),
        Span::styled(label, label_style),
        Span::styled(format!(" [{}]", row.extra_text), Style::default().fg(Color::Yellow)),
    ];
    if row.is_selected {
        spans.push(Span::styled(
            " ●",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ));
    }
    Line::from(spans)
}

fn short_label(label: &str) -> String {
    match label.strip_prefix("0x").and_then(|_| normalize_address(label)) {
        Some(address) => short_address(&address),
        None => label.to_string(),
    }
}

/// Display columns taken by the input up to a byte offset, clamped to `u16`.
fn cursor_column(input: &str, byte_pos: usize) -> u16 {
    let before = input.get(..byte_pos).unwrap_or(input);
    u16::try_from(Line::raw(before).width()).unwrap_or(u16::MAX)
}

fn status_color(status: TreeStatus) -> Color {
    match status {
        TreeStatus::Idle => Color::DarkGray,
        TreeStatus::Loading => Color::Yellow,
        TreeStatus::NoData => Color::Red,
        TreeStatus::Ready => Color::Green,
    }
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the console until the user quits.
pub async fn run_console(
    explorer: Arc<Explorer>,
    options: ConsoleOptions,
) -> Result<(), anyhow::Error> {
    use std::io::IsTerminal;
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        return Err(anyhow::anyhow!(
            "The console requires a terminal (TTY); use --plain or --json instead."
        ));
    }

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    let mut console = Console::new(explorer, options);
    let tick_rate = Duration::from_millis(100);

    loop {
        let snapshot = console.snapshot();
        console.observe(&snapshot);
        let rows = snapshot
            .view
            .as_ref()
            .map(|view| visible_rows(view, &console.collapsed))
            .unwrap_or_default();
        console.cursor = console.cursor.min(rows.len().saturating_sub(1));

        terminal.draw(|frame| console.render(frame, &snapshot, &rows))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press {
                    match console.handle_key(key_event.code, key_event.modifiers, &rows) {
                        KeyAction::Quit => break,
                        KeyAction::Submit => {
                            if console.process_input().await {
                                break;
                            }
                        }
                        KeyAction::None => {}
                    }
                }
            }
        }
    }

    restore_terminal(&mut terminal)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use franchiser_tree::{render_tree, DelegationTree};
    use franchiser_types::{votes_from_tokens, DelegationEdge, DelegationTable};

    fn view() -> ViewNode {
        let a = Address::repeat_byte(0xaa);
        let b = Address::repeat_byte(0xbb);
        let c = Address::repeat_byte(0xcc);
        let d = Address::repeat_byte(0xdd);
        let tree = DelegationTree::build(&DelegationTable::new(vec![
            vec![DelegationEdge::new(a, b, Address::repeat_byte(0xf1), votes_from_tokens(10))],
            vec![
                DelegationEdge::new(b, c, Address::repeat_byte(0xf2), votes_from_tokens(4)),
                DelegationEdge::new(b, d, Address::repeat_byte(0xf3), votes_from_tokens(1)),
            ],
        ]))
        .unwrap();
        let names = HashMap::from([(c, "carol.eth".to_string()), (d, "dave.eth".to_string())]);
        render_tree(&tree, &names, Some(Address::repeat_byte(0xf2)), SortPolicy::default())
    }

    #[test]
    fn test_rows_follow_tree_shape() {
        let rows = visible_rows(&view(), &HashSet::new());
        let prefixes: Vec<&str> = rows.iter().map(|r| r.prefix.as_str()).collect();
        assert_eq!(prefixes, vec!["", "└── ", "    ├── ", "    └── "]);
        assert_eq!(rows[2].label, "carol.eth");
        assert!(rows[2].is_selected);
        assert_eq!(rows[0].role, NodeRole::Owner);
        assert_eq!(rows[0].franchiser, None);
    }

    #[test]
    fn test_collapsed_folder_hides_children() {
        let view = view();
        let collapsed = HashSet::from([Address::repeat_byte(0xf1)]);
        let rows = visible_rows(&view, &collapsed);
        assert_eq!(rows.len(), 2);
        assert!(rows[1].collapsed);

        // Leaves ignore the collapse set.
        let leaf_key = HashSet::from([Address::repeat_byte(0xf2)]);
        assert_eq!(visible_rows(&view, &leaf_key).len(), 4);
    }

    #[test]
    fn test_cursor_column_counts_display_width() {
        assert_eq!(cursor_column("/owner alice.eth", 6), 6);
        // "é" is two bytes but one column; "界" is three bytes and two columns.
        assert_eq!(cursor_column("é界x", "é界".len()), 3);
        assert_eq!(cursor_column("abc", 99), 3);
    }

    #[test]
    fn test_cursor_column_saturates_on_long_input() {
        let input = "a".repeat(usize::from(u16::MAX) + 10);
        assert_eq!(cursor_column(&input, input.len()), u16::MAX);
    }
}
