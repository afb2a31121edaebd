use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyCode, MouseButton, MouseEventKind};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Block;
use ratatui::Terminal;

use tui_tree_diagram::{Command, JsonFile, Scene, TreeDiagram, TreeSession};

const FRAME: Duration = Duration::from_millis(16);

struct App {
    session: TreeSession,
    scene: Scene,
    /// Area the diagram was drawn into last
    area: Rect,
    status: String,
}

impl App {
    fn new() -> Self {
        Self {
            session: TreeSession::default(),
            scene: Scene::new(Instant::now()),
            area: Rect::default(),
            status: String::new(),
        }
    }

    fn load(&mut self, path: &str) {
        let mut source = JsonFile::new(path);
        match self.session.load(&mut source) {
            Ok(reconciliation) => reconciliation.present(&mut self.scene),
            Err(err) => self.status = err.to_string(),
        }
    }

    fn dispatch(&mut self, command: &Command) {
        self.scene.advance(Instant::now());
        match self.session.dispatch(command) {
            Ok(reconciliation) => {
                reconciliation.present(&mut self.scene);
                self.status.clear();
            }
            Err(err) => self.status = err.to_string(),
        }
    }

    fn click(&mut self, column: u16, row: u16) {
        let frame = self.scene.frame();
        let key = diagram(&frame, &self.session)
            .hit_test(self.area, column, row)
            .map(ToOwned::to_owned);
        if let Some(key) = key {
            self.dispatch(&Command::Toggle(key));
        }
    }
}

fn diagram<'a>(frame: &'a tui_tree_diagram::SceneFrame, session: &TreeSession) -> TreeDiagram<'a> {
    TreeDiagram::new(frame, session.layout_engine())
        .block(
            Block::bordered()
                .title("Tree Diagram")
                .title_bottom("click a node, e: expand all, c: collapse all, q: quit"),
        )
        .label_style(Style::new().fg(Color::LightGreen).add_modifier(Modifier::BOLD))
}

fn main() -> std::io::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/homo_ludens.json".to_owned());

    // Terminal initialization
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    crossterm::execute!(
        stdout,
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    // App
    let mut app = App::new();
    app.load(&path);
    let res = run_app(&mut terminal, app);

    // restore terminal
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::event::DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> std::io::Result<()> {
    loop {
        let animating = app.scene.advance(Instant::now());
        let frame = app.scene.frame();
        terminal.draw(|f| {
            app.area = f.size();
            let mut widget = diagram(&frame, &app.session);
            if !app.status.is_empty() {
                widget = widget.block(Block::bordered().title(app.status.as_str()));
            }
            f.render_widget(widget, app.area);
        })?;

        // Keep drawing while something moves, otherwise wait for input
        if animating && !crossterm::event::poll(FRAME)? {
            continue;
        }

        match crossterm::event::read()? {
            Event::Key(key) => match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Char('e') => app.dispatch(&Command::ExpandAll),
                KeyCode::Char('c') => app.dispatch(&Command::CollapseAll),
                _ => {}
            },
            Event::Mouse(mouse) => {
                if mouse.kind == MouseEventKind::Down(MouseButton::Left) {
                    app.click(mouse.column, mouse.row);
                }
            }
            _ => {}
        }
    }
}
