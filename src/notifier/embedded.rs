//! Embedded fallback email templates
//!
//! Compiled into the binary and used when no override file exists in the
//! configured templates directory. Subjects use triple braces so titles are
//! not HTML-escaped.

pub const REMINDER_SUBJECT: &str = "Task Reminder: {{{title}}}";

pub const REMINDER_HTML: &str = r#"<h2>Task Reminder</h2>
<p>Hello,</p>
<p>This is a reminder for your task:</p>
<ul>
  <li><strong>Title:</strong> {{title}}</li>
  <li><strong>Description:</strong> {{description}}</li>
  <li><strong>Deadline:</strong> {{deadline}}</li>
  <li><strong>Priority:</strong> {{priority}}</li>
  <li><strong>Category:</strong> {{category}}</li>
</ul>
<p>Please complete this task before the deadline.</p>
"#;

pub const OVERDUE_SUBJECT: &str = "Task Overdue: {{{title}}}";

pub const OVERDUE_HTML: &str = r#"<h2>Task Overdue</h2>
<p>Hello,</p>
<p>Your task is overdue:</p>
<ul>
  <li><strong>Title:</strong> {{title}}</li>
  <li><strong>Description:</strong> {{description}}</li>
  <li><strong>Deadline:</strong> {{deadline}}</li>
  <li><strong>Priority:</strong> {{priority}}</li>
  <li><strong>Category:</strong> {{category}}</li>
</ul>
<p>Please complete this task as soon as possible.</p>
"#;

pub const STALLED_SUBJECT: &str = "Task Still Unfinished: {{{title}}}";

pub const STALLED_HTML: &str = r#"<h2>Task Still Unfinished</h2>
<p>Hello,</p>
<p>This task was created on {{created_at}} and is still not marked as done:</p>
<ul>
  <li><strong>Title:</strong> {{title}}</li>
  <li><strong>Description:</strong> {{description}}</li>
  <li><strong>Deadline:</strong> {{deadline}}</li>
  <li><strong>Priority:</strong> {{priority}}</li>
  <li><strong>Category:</strong> {{category}}</li>
</ul>
<p>Mark it as completed once it is done, or update its deadline.</p>
"#;
