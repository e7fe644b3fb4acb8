//! Dashboard view: renders the wallet, token and vesting panels using
//! ratatui widgets.
//!
//! Takes a [`Dashboard`] built from the store and lays it out in a `Frame`.
//! Nothing here reads the store directly.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};

use tracer_core::format::short_address;
use tracer_core::messages::{Message, MessageKind};
use tracer_core::view::{Dashboard, TokenPanel, VestingPanel};


/// Render the whole dashboard into `area`.
pub fn render_dashboard(frame: &mut Frame, area: Rect, dash: &Dashboard) {
    let vesting_height = if dash.vesting.is_some() { 10 } else { 0 };
    let messages_height = (dash.messages.len().min(5) as u16) + 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),               // wallet header
            Constraint::Min(8),                  // token panel
            Constraint::Length(vesting_height),  // vesting panel
            Constraint::Length(messages_height), // messages
            Constraint::Length(1),               // key help / loading
        ])
        .split(area);

    render_header(frame, chunks[0], dash);
    render_token(frame, chunks[1], dash.token.as_ref());
    if let Some(vesting) = &dash.vesting {
        render_vesting(frame, chunks[2], vesting);
    }
    render_messages(frame, chunks[3], &dash.messages);
    render_status_line(frame, chunks[4], dash);
}


fn render_header(frame: &mut Frame, area: Rect, dash: &Dashboard) {
    let account = match (dash.connected, dash.account) {
        (true, Some(a)) => short_address(&a.to_string(), 4),
        _ => "not connected".to_string(),
    };
    let network = match (&dash.network, dash.chain_id) {
        (Some(name), Some(id)) => format!("{} ({})", name, id),
        (None, Some(id)) => format!("unsupported ({})", id),
        _ => "-".to_string(),
    };

    let mut lines = vec![Line::from(vec![
        Span::styled("Account ", Style::default().bold()),
        Span::raw(account),
        Span::raw("   "),
        Span::styled("Network ", Style::default().bold()),
        Span::raw(network),
    ])];
    if dash.mainnet_warning {
        lines.push(Line::styled(
            "Token not deployed on Arbitrum One yet",
            Style::default().fg(Color::Yellow),
        ));
    } else if let Some(url) = &dash.account_url {
        lines.push(Line::styled(url.clone(), Style::default().fg(Color::DarkGray)));
    }

    let title = if dash.vesting_mode { "Tracer (vesting)" } else { "Tracer" };
    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(widget, area);
}


fn render_token(frame: &mut Frame, area: Rect, token: Option<&TokenPanel>) {
    let Some(t) = token else {
        let widget = Paragraph::new("No token data")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Token"));
        frame.render_widget(widget, area);
        return;
    };

    let rows = vec![
        field("Balance", format!("{} {}", t.balance, t.symbol)),
        field("Total supply", format!("{} {}", t.total_supply, t.symbol)),
        field("Voting power", t.voting_power.clone()),
        field("Delegate", t.delegate.to_string()),
        field("Nonce", t.nonce.clone()),
    ];
    let title = format!("{} ({})", t.name, t.symbol);
    frame.render_widget(field_table(rows, title), area);
}


fn render_vesting(frame: &mut Frame, area: Rect, v: &VestingPanel) {
    let owner = v
        .owner
        .map(|o| {
            let you = if v.is_owner { " (you)" } else { "" };
            format!("{}{}", short_address(&o.to_string(), 4), you)
        })
        .unwrap_or_else(|| "-".to_string());
    let state = if v.started { "started" } else { "not started" };
    let release = if v.release_enabled { "available" } else { "unavailable" };

    let rows = vec![
        field("Owner", owner),
        field("Start", v.start.clone()),
        field("End", format!("{} ({})", v.end, state)),
        field("Unvested", v.unvested.clone()),
        field("Released", v.released.clone()),
        field("Releasable", v.releasable.clone()),
        field("Release", release.to_string()),
    ];
    let title = format!("Vesting {}", short_address(&v.address.to_string(), 4));
    frame.render_widget(field_table(rows, title), area);
}


fn render_messages(frame: &mut Frame, area: Rect, messages: &[Message]) {
    let lines: Vec<Line> = messages
        .iter()
        .take(5)
        .map(|m| Line::styled(m.text.clone(), message_style(m.kind)))
        .collect();
    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Messages"));
    frame.render_widget(widget, area);
}


fn render_status_line(frame: &mut Frame, area: Rect, dash: &Dashboard) {
    let mut text = String::from("q quit  r refresh  x dismiss");
    if !dash.loading.is_empty() {
        text.push_str("   loading: ");
        text.push_str(&dash.loading.join(", "));
    }
    frame.render_widget(Paragraph::new(text).style(Style::default().fg(Color::DarkGray)), area);
}


fn field(label: &'static str, value: String) -> Row<'static> {
    Row::new(vec![Cell::from(label).style(Style::default().bold()), Cell::from(value)])
}

fn field_table(rows: Vec<Row<'static>>, title: String) -> Table<'static> {
    Table::new(rows, [Constraint::Length(14), Constraint::Fill(1)])
        .block(Block::default().borders(Borders::ALL).title(title))
}


/// Color for a message by kind.
fn message_style(kind: MessageKind) -> Style {
    match kind {
        MessageKind::Success => Style::default().fg(Color::Green),
        MessageKind::Info => Style::default().fg(Color::Cyan),
        MessageKind::Error => Style::default().fg(Color::Red),
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use tracer_core::messages::MessageLog;
    use tracer_core::state::{paths, ObservableStore};

    fn draw(dash: &Dashboard) -> String {
        let mut terminal = Terminal::new(TestBackend::new(90, 32)).unwrap();
        terminal
            .draw(|frame| render_dashboard(frame, frame.area(), dash))
            .unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    fn store_with_token() -> ObservableStore {
        let store = ObservableStore::for_app();
        store.set(paths::SYMBOL, "TRCR".into()).unwrap();
        store.set(paths::NAME, "Tracer".into()).unwrap();
        store.set(paths::DECIMALS, 0.into()).unwrap();
        store.set(paths::BALANCE, "1500".into()).unwrap();
        store
    }

    #[test]
    fn message_style_mapping() {
        assert_eq!(message_style(MessageKind::Error), Style::default().fg(Color::Red));
        assert_eq!(message_style(MessageKind::Success), Style::default().fg(Color::Green));
    }

    #[test]
    fn renders_disconnected() {
        let store = ObservableStore::for_app();
        let log = MessageLog::new(store.clone(), 8000);
        let text = draw(&Dashboard::from_store(&store, &log, 0));
        assert!(text.contains("not connected"));
        assert!(text.contains("No token data"));
    }

    #[test]
    fn renders_token_panel_and_messages() {
        let store = store_with_token();
        let log = MessageLog::new(store.clone(), 8000);
        log.push(MessageKind::Error, "Transfer failed: rejected", 0).unwrap();
        store.set_loading("transfer", true).unwrap();

        let text = draw(&Dashboard::from_store(&store, &log, 0));
        assert!(text.contains("Tracer (TRCR)"));
        assert!(text.contains("1,500 TRCR"));
        assert!(text.contains("No delegate set"));
        assert!(text.contains("Transfer failed: rejected"));
        assert!(text.contains("loading: transfer"));
    }
}
