//! `tutorplan students`: list students that have at least one attempt.

use anyhow::Result;

use tutorplan_core::source::PlanDataSource;

use crate::render;

pub async fn run_students(source: &dyn PlanDataSource) -> Result<()> {
    let students = source.list_students().await?;
    print!("{}", render::render_students(&students));
    Ok(())
}

#[cfg(test)]
mod tests {
    use tutorplan_core::source::DemoDataSource;

    use crate::render;
    use tutorplan_core::source::PlanDataSource;

    #[tokio::test]
    async fn demo_students_render_as_table() {
        let demo = DemoDataSource::load().unwrap();
        let students = demo.list_students().await.unwrap();
        let text = render::render_students(&students);

        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("ID"));
        assert!(header.contains("SESSION"));
        let row = lines.next().unwrap();
        assert!(row.starts_with(DemoDataSource::STUDENT_ID));
        assert!(row.contains("Alex Johnson"));
        assert!(lines.next().is_none());
    }
}
