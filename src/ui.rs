use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Tabs, Wrap,
    },
};

use crate::app::{App, HomeSection, View};
use crate::chat::{ChatRole, SUGGESTED_QUESTIONS};
use crate::portfolio::{Experience, PortfolioData, Project};

/// Most draft lines shown before the input box scrolls
const MAX_INPUT_LINES: usize = 5;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.view {
        View::Home => render_home(app, frame, body_area),
        View::Chat => render_chat(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let name = app
        .portfolio
        .as_ref()
        .map(PortfolioData::name)
        .unwrap_or(crate::portfolio::DEFAULT_NAME);

    let title = Line::from(vec![
        Span::styled(format!(" {} ", name), Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!("[{}]", app.client.base_url()), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.view {
        View::Home => (" HOME ", Style::default().bg(Color::Blue).fg(Color::White)),
        View::Chat => (" CHAT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut keys: Vec<(&str, &str)> = match app.view {
        View::Home => {
            let mut keys = vec![
                ("Tab", "section"),
                ("j/k", "nav"),
                ("Enter", "ask AI"),
            ];
            if app.selected_report_url().is_some() {
                keys.push(("o", "report"));
            }
            keys.extend([("a", "chat"), ("q", "quit")]);
            keys
        }
        View::Chat => {
            let mut keys = if app.suggestions_visible() && app.session.draft().is_empty() {
                vec![("Up/Down", "suggestion")]
            } else {
                vec![("PgUp/PgDn", "scroll")]
            };
            keys.extend([
                ("Enter", "send"),
                ("Alt+Enter", "newline"),
                ("Ctrl+N", "new chat"),
                ("Esc", "home"),
            ]);
            keys
        }
    };
    keys.push(("Ctrl+C", "quit"));

    let hints = keys.into_iter().flat_map(|(key, label)| {
        [
            Span::styled(format!(" {} ", key), key_style),
            Span::styled(format!(" {} ", label), label_style),
        ]
    });

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

// Home view

fn render_home(app: &mut App, frame: &mut Frame, area: Rect) {
    let [hero_area, body_area] = Layout::vertical([
        Constraint::Length(7),
        Constraint::Min(0),
    ])
    .areas(area);

    render_hero(app, frame, hero_area);

    let [list_area, detail_area] = Layout::horizontal([
        Constraint::Length(38),
        Constraint::Min(0),
    ])
    .areas(body_area);

    // Store areas for mouse hit-testing
    app.list_area = Some(list_area);
    app.detail_area = Some(detail_area);
    app.chat_area = None;

    render_section_list(app, frame, list_area);
    render_detail(app, frame, detail_area);
}

fn render_hero(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    // Until the portfolio arrives the defaults fill in name, title and contact links
    let fallback;
    let portfolio = match &app.portfolio {
        Some(portfolio) => portfolio,
        None => {
            fallback = PortfolioData::default();
            &fallback
        }
    };

    let muted = Style::default().fg(Color::Gray);
    let mut lines = vec![
        Line::from(Span::styled(
            portfolio.name().to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(portfolio.tagline().to_string()),
    ];

    let mut about: Vec<String> = Vec::new();
    if let Some(education) = portfolio.education_line() {
        about.push(education.to_string());
    }
    if let Some(summary) = portfolio.profile.summary.as_deref() {
        about.push(summary.to_string());
    }
    if !about.is_empty() {
        lines.push(Line::from(Span::styled(about.join(" · "), muted)));
    }

    let contact = &portfolio.contact;
    lines.push(Line::from(vec![
        Span::styled("GitHub ", Style::default().fg(Color::Magenta)),
        Span::raw(contact.github().to_string()),
        Span::styled("  LinkedIn ", Style::default().fg(Color::Magenta)),
        Span::raw(contact.linkedin().to_string()),
        Span::styled("  Email ", Style::default().fg(Color::Magenta)),
        Span::raw(contact.email().to_string()),
    ]));

    let hero = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(hero, area);
}

fn render_section_list(app: &mut App, frame: &mut Frame, area: Rect) {
    let [tabs_area, list_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(area);

    let sections = HomeSection::all();
    let selected_tab = sections.iter().position(|s| *s == app.section).unwrap_or(0);
    let tabs = Tabs::new(sections.iter().map(|s| s.title()))
        .select(selected_tab)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .divider("|");
    frame.render_widget(tabs, tabs_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {} ", app.section.title()));

    let items: Vec<ListItem> = match app.section {
        HomeSection::Projects => app
            .projects()
            .iter()
            .map(|p| ListItem::new(format!(" {} ", p.name)))
            .collect(),
        HomeSection::Experience => app
            .experience()
            .iter()
            .map(|e| ListItem::new(format!(" {} @ {} ", e.title, e.company)))
            .collect(),
        HomeSection::Skills => app
            .skill_entries()
            .iter()
            .map(|s| ListItem::new(format!(" {} ", s.skill)))
            .collect(),
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let state = match app.section {
        HomeSection::Projects => &mut app.project_state,
        HomeSection::Experience => &mut app.experience_state,
        HomeSection::Skills => &mut app.skill_state,
    };

    frame.render_stateful_widget(list, list_area, state);
}

fn tag_line(technologies: &[String]) -> Line<'static> {
    let spans: Vec<Span<'static>> = technologies
        .iter()
        .flat_map(|tech| {
            [
                Span::styled(format!(" {} ", tech), Style::default().fg(Color::Black).bg(Color::LightBlue)),
                Span::raw(" "),
            ]
        })
        .collect();
    Line::from(spans)
}

fn bullet(text: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled("• ", Style::default().fg(Color::LightBlue)),
        Span::raw(text.to_string()),
    ])
}

fn project_detail(project: &Project) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(project.description.clone()), Line::default()];
    lines.extend(project.details.iter().map(|d| bullet(d)));
    if !project.details.is_empty() {
        lines.push(Line::default());
    }
    lines.push(tag_line(&project.technologies));
    lines
}

fn experience_detail(experience: &Experience) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            experience.company.clone(),
            Style::default().fg(Color::LightBlue),
        )),
        Line::from(Span::styled(
            format!("{} • {}", experience.location, experience.date),
            Style::default().fg(Color::Gray),
        )),
        Line::default(),
    ];
    lines.extend(experience.tasks.iter().map(|t| bullet(t)));
    lines.push(Line::default());
    lines.push(tag_line(&experience.technologies));

    if experience.report.is_some() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Report available: press o to open",
            Style::default().fg(Color::Magenta),
        )));
    }
    lines
}

fn render_detail(app: &App, frame: &mut Frame, area: Rect) {
    let (title, mut lines) = match app.section {
        HomeSection::Projects => match app.selected_project() {
            Some(p) => (p.name.clone(), project_detail(p)),
            None => (String::new(), Vec::new()),
        },
        HomeSection::Experience => match app.selected_experience() {
            Some(e) => (e.title.clone(), experience_detail(e)),
            None => (String::new(), Vec::new()),
        },
        HomeSection::Skills => match app.selected_skill() {
            Some(s) => {
                let category = app
                    .portfolio
                    .iter()
                    .flat_map(|p| p.skills.iter())
                    .find(|c| c.category == s.category)
                    .map(|c| c.display_name())
                    .unwrap_or_default();
                (s.skill.to_string(), vec![Line::from(Span::styled(
                    category,
                    Style::default().fg(Color::Magenta),
                ))])
            }
            None => (String::new(), Vec::new()),
        },
    };

    if app.selected_question().is_some() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Enter: ask the AI about this",
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(if title.is_empty() { String::new() } else { format!(" {} ", title) });

    let detail = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(detail, area);
}

// Chat view

/// Row and column of the draft cursor, counted in chars
fn cursor_row_col(draft: &str, cursor: usize) -> (usize, usize) {
    let before: String = draft.chars().take(cursor).collect();
    let row = before.matches('\n').count();
    let col = before.rsplit('\n').next().map_or(0, |l| l.chars().count());
    (row, col)
}

fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in app.session.transcript() {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                // User text is always shown verbatim
                lines.extend(msg.content.lines().map(|l| Line::from(l.to_string())));
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    "AI:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                lines.extend(app.renderer.render(&msg.content));
            }
        }
        lines.push(Line::default());
    }

    if app.session.is_pending() {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let draft_lines = app.session.draft().split('\n').count().clamp(1, MAX_INPUT_LINES);
    let [chat_area, input_area, note_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(draft_lines as u16 + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    app.list_area = None;
    app.detail_area = None;
    app.chat_area = Some(chat_area);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Adam's AI Assistant ");

    if app.suggestions_visible() {
        render_suggestions(app, frame, chat_block, chat_area);
    } else {
        render_transcript(app, frame, chat_block, chat_area);
    }

    render_input(app, frame, input_area);

    let note = Paragraph::new(Span::styled(
        format!(" AI can make mistakes. Verify important information. ({} view)", app.renderer.name()),
        Style::default().fg(Color::Gray),
    ));
    frame.render_widget(note, note_area);
}

fn render_suggestions(app: &mut App, frame: &mut Frame, block: Block, area: Rect) {
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [intro_area, list_area] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Min(0),
    ])
    .areas(inner);

    let intro = Paragraph::new(Text::from(vec![
        Line::from(Span::styled(
            "Ask me anything about Adam",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "I'm an AI assistant trained on Adam's experience, skills, and projects.",
            Style::default().fg(Color::Gray),
        )),
        Line::default(),
    ]))
    .wrap(Wrap { trim: true });
    frame.render_widget(intro, intro_area);

    let items: Vec<ListItem> = SUGGESTED_QUESTIONS
        .iter()
        .map(|q| ListItem::new(format!(" {} ", q)))
        .collect();

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, list_area, &mut app.suggestion_state);
}

fn render_transcript(app: &mut App, frame: &mut Frame, block: Block, area: Rect) {
    let inner = block.inner(area);
    let lines = transcript_lines(app);

    let transcript = Paragraph::new(lines).wrap(Wrap { trim: false });

    // Rows after word wrapping, measured the same way the widget lays them out
    let total = transcript.line_count(inner.width).min(u16::MAX as usize) as u16;
    let max_scroll = total.saturating_sub(inner.height);
    if app.chat_follow || app.chat_scroll > max_scroll {
        app.chat_scroll = max_scroll;
    }

    let chat = transcript.block(block).scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);

    if total > inner.height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        let mut scrollbar_state = ScrollbarState::new(max_scroll as usize)
            .position(app.chat_scroll as usize);

        frame.render_stateful_widget(
            scrollbar,
            area.inner(ratatui::layout::Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let pending = app.session.is_pending();

    // Submission is disabled while a reply is outstanding
    let (border_color, title) = if pending {
        (Color::DarkGray, " Waiting for reply... ")
    } else if app.session.can_submit() {
        (Color::Yellow, " Ask me anything about Adam... (Enter to send) ")
    } else {
        (Color::Gray, " Ask me anything about Adam... ")
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let inner = block.inner(area);
    let (row, col) = cursor_row_col(app.session.draft(), app.session.cursor());

    // Scroll so the cursor stays inside the box
    let row_offset = row.saturating_sub((inner.height as usize).saturating_sub(1));
    let width = inner.width as usize;
    let col_offset = if width == 0 || col < width { 0 } else { col - width + 1 };

    let input = Paragraph::new(app.session.draft().to_string())
        .style(Style::default().fg(Color::Cyan))
        .block(block)
        .scroll((row_offset as u16, col_offset as u16));
    frame.render_widget(input, area);

    frame.set_cursor_position((
        inner.x + (col - col_offset) as u16,
        inner.y + (row - row_offset) as u16,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::portfolio::{DEFAULT_EMAIL, DEFAULT_GITHUB, DEFAULT_NAME};
    use crate::render::PlainTextRenderer;
    use crate::tui::EventHandler;
    use ratatui::{backend::TestBackend, Terminal};

    fn test_app() -> (App, EventHandler) {
        let events = EventHandler::detached();
        let app = App::new(
            ApiClient::new("http://localhost:8000"),
            Box::new(PlainTextRenderer),
            events.sender(),
        );
        (app, events)
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> Vec<String> {
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect())
            .collect()
    }

    #[test]
    fn test_cursor_row_col() {
        assert_eq!(cursor_row_col("", 0), (0, 0));
        assert_eq!(cursor_row_col("abc", 2), (0, 2));
        assert_eq!(cursor_row_col("ab\ncdé", 6), (1, 3));
        assert_eq!(cursor_row_col("ab\n", 3), (1, 0));
    }

    #[test]
    fn test_home_shows_contact_before_portfolio_loads() {
        let (mut app, _events) = test_app();
        let mut terminal = Terminal::new(TestBackend::new(160, 24)).unwrap();

        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let screen = screen_text(&terminal).join("\n");
        assert!(screen.contains(DEFAULT_NAME));
        assert!(screen.contains(DEFAULT_GITHUB));
        assert!(screen.contains(DEFAULT_EMAIL));
    }

    #[test]
    fn test_pending_chat_shows_thinking() {
        let (mut app, _events) = test_app();
        app.navigate(View::Chat);
        app.session.begin_send(Some("What are your skills?"));
        let mut terminal = Terminal::new(TestBackend::new(40, 20)).unwrap();

        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let screen = screen_text(&terminal);
        assert!(screen.iter().any(|row| row.contains("What are your skills?")));
        assert!(screen.iter().any(|row| row.contains("Thinking.")));
    }

    #[test]
    fn test_newest_exchange_is_in_view() {
        let (mut app, _events) = test_app();
        app.navigate(View::Chat);
        for i in 0..6 {
            app.session.begin_send(Some(format!("question {}", i).as_str()));
            app.chat_settled(Ok(format!("answer {}", i)));
        }
        let mut terminal = Terminal::new(TestBackend::new(40, 20)).unwrap();

        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let screen = screen_text(&terminal);
        assert!(screen.iter().any(|row| row.contains("question 5")));
        assert!(screen.iter().any(|row| row.contains("answer 5")));
        assert!(!screen.iter().any(|row| row.contains("Thinking")));
    }

    #[test]
    fn test_long_reply_scrolls_to_last_word() {
        let (mut app, _events) = test_app();
        app.navigate(View::Chat);
        let mut reply: Vec<String> = (0..60).map(|i| format!("word{:02}", i)).collect();
        reply.push("THEEND".to_string());

        app.session.begin_send(Some("Tell me everything"));
        app.chat_settled(Ok(reply.join(" ")));
        let mut terminal = Terminal::new(TestBackend::new(30, 20)).unwrap();

        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let screen = screen_text(&terminal);
        assert!(
            screen.iter().any(|row| row.contains("THEEND")),
            "last word missing from:\n{}",
            screen.join("\n")
        );
    }
}
